use crate::decorator::CodegenDecorator;
use crate::error::Result;
use crate::model::{Model, ShapeId};
use crate::transform::retryable;
use std::collections::BTreeSet;

/// Marks a fixed set of a single service's errors as retryable server faults.
pub struct RetryableErrorsDecorator {
    service: ShapeId,
    errors: BTreeSet<ShapeId>,
}

impl RetryableErrorsDecorator {
    pub fn new(service: ShapeId, errors: impl IntoIterator<Item = ShapeId>) -> Self {
        Self {
            service,
            errors: errors.into_iter().collect(),
        }
    }
}

impl CodegenDecorator for RetryableErrorsDecorator {
    fn name(&self) -> &str {
        "RetryableErrors"
    }

    fn applies_to(&self, service: &ShapeId) -> bool {
        *service == self.service
    }

    fn transform_model(&self, _service: &ShapeId, model: Model) -> Result<Model> {
        retryable::transform(model, &self.errors)
    }
}
