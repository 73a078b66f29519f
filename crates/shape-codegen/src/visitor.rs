//! The top-level driver of a generation run.

use crate::config::{CodegenSettings, CodegenTarget};
use crate::context::CodegenContext;
use crate::decorator::{
    CodegenDecorator, CombinedDecorator, ConstrainedMemberDecorator, apply_decorators,
};
use crate::error::Result;
use crate::event_stream::{UnmarshallPlan, event_stream_union};
use crate::generators::{
    ConfigGenerator, EndpointGenerator, OperationGenerator, config_module, endpoint_module,
};
use crate::model::{Model, Shape};
use crate::protocol::{default_protocols, select_protocol};
use crate::writer::{RustCrate, RustWriter, writable};
use std::rc::Rc;
use tracing::{debug, info};

/// Generates a crate for one service.
///
/// ```
/// use shape_codegen::config::CodegenSettings;
/// use shape_codegen::model::{MemberDef, Model, ShapeId, Trait};
/// use shape_codegen::visitor::CodegenVisitor;
///
/// let model = Model::builder()
///     .structure("ns#Input", [], [MemberDef::new("id", "smithy.api#String")])
///     .operation("ns#GetThing", Some("ns#Input"), None, &[])
///     .service("ns#Svc", "1", &["ns#GetThing"], [Trait::Protocol("aws.protocols#restJson1".into())])
///     .build()
///     .unwrap();
/// let settings = CodegenSettings::new(ShapeId::parse("ns#Svc").unwrap(), "svc");
/// let krate = CodegenVisitor::new(settings, Vec::new()).generate(model).unwrap();
/// assert!(krate.render("src/operation.rs").unwrap().contains("pub struct GetThing;"));
/// ```
pub struct CodegenVisitor {
    settings: CodegenSettings,
    decorator: CombinedDecorator,
}

impl CodegenVisitor {
    /// Server targets always run [`ConstrainedMemberDecorator`] in addition to
    /// `decorators`.
    pub fn new(settings: CodegenSettings, decorators: Vec<Box<dyn CodegenDecorator>>) -> Self {
        let extras: Vec<Box<dyn CodegenDecorator>> = match settings.target() {
            CodegenTarget::Server => vec![Box::new(ConstrainedMemberDecorator)],
            CodegenTarget::Client => Vec::new(),
        };
        Self {
            settings,
            decorator: CombinedDecorator::new(decorators, extras),
        }
    }

    pub fn decorator(&self) -> &CombinedDecorator {
        &self.decorator
    }

    /// Transform `model` through the decorators and render every module.
    pub fn generate(&self, model: Model) -> Result<RustCrate> {
        let service = &self.settings.service;
        info!(
            service = %service,
            target = ?self.settings.target(),
            "generating crate"
        );

        let model = apply_decorators(model, service, &self.decorator)?;
        let ctx = CodegenContext::new(Rc::new(model), self.settings.clone())?;
        let protocols = self.decorator.protocols(service, default_protocols())?;
        let protocol = select_protocol(ctx.service_shape()?, &protocols)?.protocol(&ctx);
        debug!(protocol = protocol.name(), "selected protocol");

        let mut krate = RustCrate::new(&self.settings);
        let operations = ctx.model().service_operations(service)?;
        krate.lib(|w| self.render_lib(&ctx, &operations, w))?;

        let config = self.decorator.config_customizations(&ctx, Vec::new())?;
        krate.with_module(&config_module(), |w| {
            ConfigGenerator::new(&config).render(w)
        })?;

        let endpoint = self.decorator.endpoint_customizations(&ctx, Vec::new())?;
        krate.with_module(&endpoint_module(), |w| {
            EndpointGenerator::new(&endpoint).render(w)
        })?;

        for operation in &operations {
            let customizations =
                self.decorator
                    .operation_customizations(&ctx, operation, Vec::new())?;
            let mut generator = OperationGenerator::new(&ctx, operation, &customizations);
            if let Some(union) = event_stream_union(ctx.model(), operation) {
                let plan = UnmarshallPlan::build(&ctx, protocol.as_ref(), operation, union)?;
                generator = generator.with_unmarshaller(plan.render());
            }
            generator.render(&mut krate)?;
        }

        krate.finalize()?;
        info!(files = krate.files().count(), "generated crate");
        Ok(krate)
    }

    fn render_lib(&self, ctx: &CodegenContext, operations: &[&Shape], w: &mut RustWriter) -> Result<()> {
        let description = self
            .settings
            .module_description
            .clone()
            .or_else(|| {
                ctx.service_shape()
                    .ok()
                    .and_then(Shape::documentation)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("Generated crate for `{}`.", ctx.service_id().name()));
        let symbols = operations
            .iter()
            .map(|operation| ctx.symbol_provider().to_symbol(operation))
            .collect::<Result<Vec<_>>>()?;
        let listing: Vec<String> = symbols
            .iter()
            .map(|symbol| format!("- [`{}`]({})", symbol.name(), symbol.rust_type()))
            .collect();

        w.first(writable(move |w| {
            w.container_docs(&description);
            if !listing.is_empty() {
                w.container_docs("");
                w.container_docs("# Operations");
                w.container_docs("");
                w.container_docs(&listing.join("\n"));
            }
            w.rust("#![allow(clippy::new_without_default)]");
            Ok(())
        }))
    }
}
