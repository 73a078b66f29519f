use crate::decorator::CodegenDecorator;
use crate::error::Result;
use crate::model::{Model, ShapeId};
use crate::transform::constrained_member;

/// Runs constrained-member extraction. Added to every server pipeline.
pub struct ConstrainedMemberDecorator;

impl CodegenDecorator for ConstrainedMemberDecorator {
    fn name(&self) -> &str {
        "ConstrainedMember"
    }

    // Before any decorator that might read member constraints.
    fn order(&self) -> i8 {
        i8::MIN
    }

    fn transform_model(&self, _service: &ShapeId, model: Model) -> Result<Model> {
        constrained_member::transform(model)
    }
}
