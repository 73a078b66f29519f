//! Model rewrites run before generation.
//!
//! Every pass is a pure `Model -> Result<Model>` function.

pub mod constrained_member;
pub mod retryable;
