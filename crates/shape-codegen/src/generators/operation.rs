use crate::context::CodegenContext;
use crate::decorator::{OperationCustomization, OperationSection};
use crate::error::Result;
use crate::naming::to_snake_case;
use crate::model::Shape;
use crate::symbol::RuntimeType;
use crate::writer::{RustCrate, RustModule, RustWriter};
use std::rc::Rc;

pub fn operation_module() -> RustModule {
    RustModule::public("operation").with_documentation("All operations that this crate can perform.")
}

/// Renders `crate::operation::<name>` for one operation.
pub struct OperationGenerator<'a> {
    ctx: &'a CodegenContext,
    operation: &'a Shape,
    customizations: &'a [Rc<dyn OperationCustomization>],
    unmarshaller: Option<RuntimeType>,
}

impl<'a> OperationGenerator<'a> {
    pub fn new(
        ctx: &'a CodegenContext,
        operation: &'a Shape,
        customizations: &'a [Rc<dyn OperationCustomization>],
    ) -> Self {
        Self {
            ctx,
            operation,
            customizations,
            unmarshaller: None,
        }
    }

    /// Expose `unmarshaller` for the operation's event stream.
    pub fn with_unmarshaller(mut self, unmarshaller: RuntimeType) -> Self {
        self.unmarshaller = Some(unmarshaller);
        self
    }

    /// The inline module holding the operation.
    pub fn module(&self) -> RustModule {
        RustModule::public(to_snake_case(self.operation.id().name()))
            .with_documentation(format!(
                "Types for the `{}` operation.",
                self.operation.id().name()
            ))
            .child_of(&operation_module())
            .inline()
    }

    fn sections(&self, w: &mut RustWriter, section: &OperationSection) -> Result<()> {
        for customization in self.customizations {
            customization.section(section).write_to(w)?;
        }
        Ok(())
    }

    pub fn render(&self, krate: &mut RustCrate) -> Result<()> {
        let symbol = self.ctx.symbol_provider().to_symbol(self.operation)?;
        let name = symbol.name().to_string();
        let id = self.operation.id().clone();
        krate.with_module(&self.module(), |w| {
            w.document_shape(self.operation, self.ctx.model(), None);
            self.sections(w, &OperationSection::Docs { operation: id.clone() })?;
            w.deprecated_shape(self.operation);
            w.rust(&format!(
                r#"
                #[derive(Debug, Clone, Default)]
                #[non_exhaustive]
                pub struct {name};
                "#
            ));
            w.rust_block(&format!("impl {name}"), |w| {
                w.rust(&format!(
                    r#"
                    /// Creates a new `{name}` operation.
                    pub fn new() -> Self {{
                        Self
                    }}
                    "#
                ));
                if let Some(unmarshaller) = &self.unmarshaller {
                    w.rust_template(
                        r#"
                        /// Creates the decoder for this operation's event stream.
                        pub fn unmarshaller() -> #{Unmarshaller} {
                            #{Unmarshaller}::new()
                        }
                        "#,
                        &[("Unmarshaller", unmarshaller.into())],
                    )?;
                }
                self.sections(
                    w,
                    &OperationSection::Impl {
                        operation: id.clone(),
                        operation_name: name.clone(),
                    },
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenSettings;
    use crate::model::{MemberDef, Model, ShapeId, Trait};
    use crate::writer::{Writable, writable};

    struct Paginated;

    impl OperationCustomization for Paginated {
        fn section(&self, section: &OperationSection) -> Writable {
            match section {
                OperationSection::Docs { .. } => Writable::text("/// This operation is paginated."),
                OperationSection::Impl { operation_name, .. } => {
                    let operation_name = operation_name.clone();
                    writable(move |w| {
                        w.rust(&format!(
                            "pub fn paginator() -> &'static str {{ \"{operation_name}Paginator\" }}"
                        ));
                        Ok(())
                    })
                }
            }
        }
    }

    fn ctx() -> CodegenContext {
        let model = Model::builder()
            .structure("ns#Input", [], [MemberDef::new("id", "smithy.api#String")])
            .operation("ns#ListThings", Some("ns#Input"), None, &[])
            .operation("ns#GetThing", Some("ns#Input"), None, &[])
            .service("ns#Svc", "1", &["ns#ListThings", "ns#GetThing"], [])
            .build()
            .unwrap();
        let mut builder = model.to_builder();
        let id = ShapeId::parse("ns#GetThing").unwrap();
        let deprecated = model.get(&id).unwrap().clone().with_trait(Trait::Deprecated {
            message: Some("use ListThings".into()),
            since: None,
        });
        let documented = model
            .get(&ShapeId::parse("ns#ListThings").unwrap())
            .unwrap()
            .clone()
            .with_trait(Trait::Documentation("Lists things.".into()));
        let model = builder.add_shape(deprecated).add_shape(documented).build().unwrap();
        let settings = CodegenSettings::new(ShapeId::parse("ns#Svc").unwrap(), "svc");
        CodegenContext::new(Rc::new(model), settings).unwrap()
    }

    fn render(ctx: &CodegenContext, name: &str, customizations: &[Rc<dyn OperationCustomization>]) -> RustCrate {
        let operation = ctx.model().get(&ShapeId::parse(name).unwrap()).unwrap();
        let mut krate = RustCrate::new(ctx.settings());
        OperationGenerator::new(ctx, operation, customizations)
            .render(&mut krate)
            .unwrap();
        krate.finalize().unwrap();
        krate
    }

    #[test]
    fn test_operation_struct_and_sections() {
        let ctx = ctx();
        let customizations: Vec<Rc<dyn OperationCustomization>> = vec![Rc::new(Paginated)];
        let krate = render(&ctx, "ns#ListThings", &customizations);
        let code = krate.render("src/operation.rs").unwrap();
        assert!(code.contains("/// Types for the `ListThings` operation.\npub mod list_things {"));
        assert!(code.contains("    /// Lists things.\n    /// This operation is paginated.\n"));
        assert!(code.contains("    pub struct ListThings;"));
        assert!(code.contains("\"ListThingsPaginator\""));
        syn::parse_file(&code).unwrap();

        let lib = krate.render("src/lib.rs").unwrap();
        assert!(lib.contains("/// All operations that this crate can perform.\npub mod operation;"));
    }

    #[test]
    fn test_deprecated_undocumented_operation() {
        let ctx = ctx();
        let krate = render(&ctx, "ns#GetThing", &[]);
        let code = krate.render("src/operation.rs").unwrap();
        assert!(code.contains("#[allow(missing_docs)] // documentation missing in model"));
        assert!(code.contains(r#"#[deprecated(note = "use ListThings")]"#));
        assert!(!code.contains("fn unmarshaller"));
        syn::parse_file(&code).unwrap();
    }

    #[test]
    fn test_unmarshaller_is_rendered_on_reference() {
        let ctx = ctx();
        let operation = ctx.model().get(&ShapeId::parse("ns#GetThing").unwrap()).unwrap();
        let unmarshaller = RuntimeType::for_inline_fun(
            "ThingUnmarshaller",
            RustModule::private("event_stream_serde"),
            writable(|w| {
                w.rust("pub struct ThingUnmarshaller;");
                w.rust("impl ThingUnmarshaller { pub fn new() -> Self { ThingUnmarshaller } }");
                Ok(())
            }),
        );
        let mut krate = RustCrate::new(ctx.settings());
        OperationGenerator::new(&ctx, operation, &[])
            .with_unmarshaller(unmarshaller)
            .render(&mut krate)
            .unwrap();
        krate.finalize().unwrap();

        let code = krate.render("src/operation.rs").unwrap();
        assert!(code.contains("pub fn unmarshaller() -> crate::event_stream_serde::ThingUnmarshaller {"));
        assert!(code.contains("crate::event_stream_serde::ThingUnmarshaller::new()"));
        let serde = krate.render("src/event_stream_serde.rs").unwrap();
        assert!(serde.contains("pub struct ThingUnmarshaller;"));
        assert!(krate.render("src/lib.rs").unwrap().contains("mod event_stream_serde;"));
    }
}
