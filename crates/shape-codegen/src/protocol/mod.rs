//! Wire protocols.
//!
//! A protocol hands out runtime types for its payload and error parsers. The
//! generators treat these as black boxes: they only reference them by path.

mod json;

pub use json::{JsonProtocol, JsonProtocolFactory};

use crate::context::CodegenContext;
use crate::error::{CodegenError, Result};
use crate::model::{Shape, ShapeKind, Trait, TraitKind};
use crate::symbol::RuntimeType;
use std::collections::BTreeMap;
use std::rc::Rc;

pub const REST_JSON_1: &str = "aws.protocols#restJson1";
pub const AWS_JSON_1_0: &str = "aws.protocols#awsJson1_0";
pub const AWS_JSON_1_1: &str = "aws.protocols#awsJson1_1";

/// Parsers for structured data (payload members and modeled errors) of one operation.
pub trait StructuredDataParserGenerator {
    /// `fn(&[u8]) -> Result<T, E>` decoding `member`'s target from a payload.
    fn payload_parser(&self, member: &Shape) -> Result<RuntimeType>;

    /// `fn(&[u8], Builder) -> Result<Builder, E>` for an error structure, if the
    /// protocol can parse it.
    fn error_parser(&self, structure: &Shape) -> Result<Option<RuntimeType>>;
}

pub trait Protocol {
    /// Absolute id of the protocol trait.
    fn name(&self) -> &str;

    fn structured_data_parser(&self, operation: &Shape) -> Box<dyn StructuredDataParserGenerator + '_>;

    /// `fn(&[u8]) -> Result<ErrorMetadata, E>` parsing the protocol-level error carried
    /// by an exception frame.
    fn parse_event_stream_generic_error(&self, operation: &Shape) -> RuntimeType;
}

pub trait ProtocolGeneratorFactory {
    fn protocol(&self, ctx: &CodegenContext) -> Box<dyn Protocol>;
}

/// Protocol trait id -> factory.
pub type ProtocolMap = BTreeMap<String, Rc<dyn ProtocolGeneratorFactory>>;

/// The JSON protocols this crate knows how to generate.
pub fn default_protocols() -> ProtocolMap {
    [REST_JSON_1, AWS_JSON_1_0, AWS_JSON_1_1]
        .into_iter()
        .map(|name| {
            let factory: Rc<dyn ProtocolGeneratorFactory> = Rc::new(JsonProtocolFactory::new(name));
            (name.to_string(), factory)
        })
        .collect()
}

/// The factory for the protocol `service` declares.
pub fn select_protocol(service: &Shape, protocols: &ProtocolMap) -> Result<Rc<dyn ProtocolGeneratorFactory>> {
    if !matches!(service.kind(), ShapeKind::Service { .. }) {
        return Err(CodegenError::UnexpectedShapeKind {
            id: service.id().clone(),
            expected: "service",
        });
    }
    let declared = match service.get_trait(TraitKind::Protocol) {
        Some(Trait::Protocol(name)) => Some(name.clone()),
        _ => None,
    };
    declared
        .as_ref()
        .and_then(|name| protocols.get(name))
        .cloned()
        .ok_or_else(|| CodegenError::UnsupportedProtocol {
            service: service.id().clone(),
            protocol: declared,
        })
}
