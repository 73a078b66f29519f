//! Generators for the modules of the output crate.
//!
//! Each generator owns one module shape and exposes the sections decorators can
//! customize. They are driven by [`CodegenVisitor`](crate::visitor::CodegenVisitor).

mod config;
mod endpoint;
mod operation;

pub use config::{ConfigGenerator, config_module};
pub use endpoint::{EndpointGenerator, endpoint_module};
pub use operation::{OperationGenerator, operation_module};
