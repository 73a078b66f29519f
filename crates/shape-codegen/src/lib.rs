//! # shape-codegen
//!
//! Rust code generator for shape-based service models. A model is a graph of typed
//! shapes annotated with traits; the generator renders it into the modules of a
//! client or server SDK crate.
//!
//! ## Pipeline
//!
//! 1. Decorators rewrite the model ([`decorator::apply_decorators`]), for example to
//!    lift constraint traits off members ([`transform::constrained_member`]).
//! 2. [`visitor::CodegenVisitor`] walks the service and drives the generators, which
//!    write into a [`writer::RustCrate`] through [`writer::RustWriter`] templates.
//! 3. Inline dependencies, such as event stream unmarshallers, are rendered into their
//!    owning modules on first reference.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shape_codegen::{CodegenSettings, CodegenVisitor, RetryableErrorsDecorator};
//!
//! let settings = CodegenSettings::from_path("smithy-build.json")?;
//! let retryable = RetryableErrorsDecorator::new(settings.service.clone(), errors);
//! let krate = CodegenVisitor::new(settings, vec![Box::new(retryable)]).generate(model)?;
//! krate.write_to_dir("generated")?;
//! ```

pub mod config;
pub mod context;
pub mod decorator;
pub mod error;
pub mod event_stream;
pub mod generators;
pub mod model;
pub mod naming;
pub mod protocol;
pub mod symbol;
pub mod transform;
pub mod visitor;
pub mod writer;

pub use config::{CodegenSettings, CodegenTarget};
pub use context::CodegenContext;
pub use decorator::{
    CodegenDecorator, CombinedDecorator, ConstrainedMemberDecorator, RetryableErrorsDecorator,
    apply_decorators,
};
pub use error::{CodegenError, Result};
pub use model::{Model, Shape, ShapeId};
pub use visitor::CodegenVisitor;
pub use writer::{RustCrate, RustWriter};
