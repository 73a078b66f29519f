//! The customization pipeline.
//!
//! A [`CodegenDecorator`] may rewrite the model before generation and contribute
//! customizations (section writers) to the operation, config and endpoint generators.
//! [`CombinedDecorator`] folds an ordered list of decorators into one.

mod combined;
mod constrained;
mod retryable;

pub use combined::CombinedDecorator;
pub use constrained::ConstrainedMemberDecorator;
pub use retryable::RetryableErrorsDecorator;

use crate::context::CodegenContext;
use crate::error::{CodegenError, Result};
use crate::model::{Model, Shape, ShapeId, ShapeKind};
use crate::protocol::ProtocolMap;
use crate::writer::Writable;
use std::rc::Rc;

/// Points in the operation module where customizations can write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationSection {
    /// Extra `///` lines on the operation struct.
    Docs { operation: ShapeId },
    /// Items inside `impl <Operation> { .. }`.
    Impl {
        operation: ShapeId,
        operation_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    /// Fields of `Config`.
    ConfigStruct,
    /// Items inside `impl Config`.
    ConfigImpl,
    /// Fields of the config `Builder`.
    BuilderStruct,
    /// Items inside `impl Builder`.
    BuilderImpl,
    /// Field initializers inside `Builder::build`.
    BuilderBuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSection {
    /// Fields of endpoint `Params`.
    ParamsStruct,
    /// Field initializers in `Params::from_config`.
    ParamsFromConfig,
}

pub trait OperationCustomization {
    fn section(&self, section: &OperationSection) -> Writable;
}

pub trait ConfigCustomization {
    fn section(&self, section: ConfigSection) -> Writable;
}

pub trait EndpointCustomization {
    fn section(&self, section: EndpointSection) -> Writable;
}

pub type OperationCustomizations = Vec<Rc<dyn OperationCustomization>>;
pub type ConfigCustomizations = Vec<Rc<dyn ConfigCustomization>>;
pub type EndpointCustomizations = Vec<Rc<dyn EndpointCustomization>>;

/// A plugin hooking into code generation.
///
/// Every hook has an identity default, so a decorator implements only what it
/// customizes.
pub trait CodegenDecorator {
    fn name(&self) -> &str;

    /// Decorators run in ascending `order`; ties keep list order.
    fn order(&self) -> i8 {
        0
    }

    /// Decorators that do not apply to a service are skipped for it.
    fn applies_to(&self, _service: &ShapeId) -> bool {
        true
    }

    fn transform_model(&self, _service: &ShapeId, model: Model) -> Result<Model> {
        Ok(model)
    }

    fn operation_customizations(
        &self,
        _ctx: &CodegenContext,
        _operation: &Shape,
        base: OperationCustomizations,
    ) -> Result<OperationCustomizations> {
        Ok(base)
    }

    fn config_customizations(
        &self,
        _ctx: &CodegenContext,
        base: ConfigCustomizations,
    ) -> Result<ConfigCustomizations> {
        Ok(base)
    }

    fn endpoint_customizations(
        &self,
        _ctx: &CodegenContext,
        base: EndpointCustomizations,
    ) -> Result<EndpointCustomizations> {
        Ok(base)
    }

    fn protocols(&self, _service: &ShapeId, current: ProtocolMap) -> Result<ProtocolMap> {
        Ok(current)
    }
}

/// Run every applicable decorator's model transform over `model`.
///
/// The service must exist in the input, and the result must still be a valid model.
pub fn apply_decorators(
    model: Model,
    service: &ShapeId,
    decorators: &dyn CodegenDecorator,
) -> Result<Model> {
    let shape = model.expect_shape(service)?;
    if !matches!(shape.kind(), ShapeKind::Service { .. }) {
        return Err(CodegenError::UnexpectedShapeKind {
            id: service.clone(),
            expected: "service",
        });
    }
    let transformed = decorators.transform_model(service, model)?;
    transformed.validate()?;
    Ok(transformed)
}
