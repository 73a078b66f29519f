//! Decoded values produced by [`UnmarshallPlan::unmarshall`](super::UnmarshallPlan::unmarshall).

use crate::symbol::RuntimeType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;

pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Blob(Vec<u8>),
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// A structured payload as decoded by the protocol.
    Document(serde_json::Value),
    Structure(StructureValue),
}

/// Field values of a structure, keyed by member name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureValue {
    fields: BTreeMap<String, Value>,
}

impl StructureValue {
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Set a field; a later value for the same field wins.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// A modeled union variant.
    Variant { name: String, value: Value },
    /// An event type the client does not know about.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedError {
    /// A modeled error. Clients also carry the protocol-level error.
    Modeled {
        name: String,
        value: StructureValue,
        generic: Option<GenericError>,
    },
    /// An exception with no modeled (or parseable) counterpart.
    Generic(GenericError),
    /// The protocol-level error itself could not be parsed.
    Unhandled(String),
}

/// Protocol-level error metadata carried by every exception frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenericError {
    #[serde(default, alias = "__type")]
    pub code: Option<String>,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
}

/// Runs the protocol parsers a plan refers to.
pub trait PayloadDecoder {
    fn decode_payload(&self, parser: &RuntimeType, payload: &[u8]) -> Result<Value, BoxError>;

    fn decode_error(&self, parser: &RuntimeType, payload: &[u8]) -> Result<StructureValue, BoxError>;

    fn decode_generic_error(&self, parser: &RuntimeType, payload: &[u8]) -> Result<GenericError, BoxError>;
}

/// Decodes JSON payloads. An empty payload is an empty object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadDecoder;

fn json(payload: &[u8]) -> Result<serde_json::Value, serde_json::Error> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(payload)
}

impl PayloadDecoder for JsonPayloadDecoder {
    fn decode_payload(&self, _parser: &RuntimeType, payload: &[u8]) -> Result<Value, BoxError> {
        Ok(Value::Document(json(payload)?))
    }

    fn decode_error(&self, _parser: &RuntimeType, payload: &[u8]) -> Result<StructureValue, BoxError> {
        let serde_json::Value::Object(object) = json(payload)? else {
            return Err("error payload is not a JSON object".into());
        };
        Ok(object
            .into_iter()
            .fold(StructureValue::default(), |acc, (name, value)| {
                acc.with_field(name, Value::Document(value))
            }))
    }

    fn decode_generic_error(&self, _parser: &RuntimeType, payload: &[u8]) -> Result<GenericError, BoxError> {
        Ok(serde_json::from_value(json(payload)?)?)
    }
}
