use crate::error::Result;
use crate::model::{ErrorFault, Model, ShapeId, Trait};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Turn each designated error structure into a retryable server fault.
///
/// Ids that are missing from the model or that do not name an error structure are
/// left alone.
pub fn transform(model: Model, errors: &BTreeSet<ShapeId>) -> Result<Model> {
    let mut builder = model.to_builder();
    for id in errors {
        let Some(shape) = model.get(id) else {
            warn!(error = %id, "designated retryable error is not in the model");
            continue;
        };
        if !(shape.is_structure() && shape.is_error()) {
            continue;
        }
        info!(error = %id, "adding @retryable trait and setting its error type to 'server'");
        builder.add_shape(
            shape
                .clone()
                .with_trait(Trait::Error(ErrorFault::Server))
                .with_trait(Trait::Retryable { throttling: false }),
        );
    }
    builder.build()
}
