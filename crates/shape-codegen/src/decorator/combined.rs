use crate::context::CodegenContext;
use crate::decorator::{
    CodegenDecorator, ConfigCustomizations, EndpointCustomizations, OperationCustomizations,
};
use crate::error::{CodegenError, Result};
use crate::model::{Model, Shape, ShapeId};
use crate::protocol::ProtocolMap;
use tracing::{debug, error, info};

/// Folds an ordered list of decorators into a single decorator.
///
/// Every hook is a left fold: the first applicable decorator sees the base value and
/// each following one sees its predecessor's result.
pub struct CombinedDecorator {
    decorators: Vec<Box<dyn CodegenDecorator>>,
}

impl CombinedDecorator {
    /// Combine `decorators` and `extras`, stably sorted by [`CodegenDecorator::order`].
    pub fn new(
        decorators: Vec<Box<dyn CodegenDecorator>>,
        extras: Vec<Box<dyn CodegenDecorator>>,
    ) -> Self {
        let mut decorators: Vec<_> = decorators.into_iter().chain(extras).collect();
        decorators.sort_by_key(|d| d.order());
        for decorator in &decorators {
            info!(
                decorator = decorator.name(),
                order = decorator.order(),
                "adding codegen decorator"
            );
        }
        Self { decorators }
    }

    /// Decorator names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    fn fold<T>(
        &self,
        service: &ShapeId,
        base: T,
        f: impl Fn(&dyn CodegenDecorator, T) -> Result<T>,
    ) -> Result<T> {
        let mut acc = base;
        for decorator in &self.decorators {
            if !decorator.applies_to(service) {
                debug!(
                    decorator = decorator.name(),
                    service = %service,
                    "decorator does not apply to service, skipping"
                );
                continue;
            }
            acc = f(decorator.as_ref(), acc).map_err(|source| {
                error!(decorator = decorator.name(), error = %source, "decorator failed");
                CodegenError::Decorator {
                    decorator: decorator.name().to_string(),
                    source: Box::new(source),
                }
            })?;
        }
        Ok(acc)
    }
}

impl CodegenDecorator for CombinedDecorator {
    fn name(&self) -> &str {
        "CombinedDecorator"
    }

    fn transform_model(&self, service: &ShapeId, model: Model) -> Result<Model> {
        self.fold(service, model, |d, model| d.transform_model(service, model))
    }

    fn operation_customizations(
        &self,
        ctx: &CodegenContext,
        operation: &Shape,
        base: OperationCustomizations,
    ) -> Result<OperationCustomizations> {
        self.fold(ctx.service_id(), base, |d, base| {
            d.operation_customizations(ctx, operation, base)
        })
    }

    fn config_customizations(
        &self,
        ctx: &CodegenContext,
        base: ConfigCustomizations,
    ) -> Result<ConfigCustomizations> {
        self.fold(ctx.service_id(), base, |d, base| {
            d.config_customizations(ctx, base)
        })
    }

    fn endpoint_customizations(
        &self,
        ctx: &CodegenContext,
        base: EndpointCustomizations,
    ) -> Result<EndpointCustomizations> {
        self.fold(ctx.service_id(), base, |d, base| {
            d.endpoint_customizations(ctx, base)
        })
    }

    fn protocols(&self, service: &ShapeId, current: ProtocolMap) -> Result<ProtocolMap> {
        self.fold(service, current, |d, map| d.protocols(service, map))
    }
}
