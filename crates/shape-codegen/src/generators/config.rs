use crate::decorator::{ConfigCustomization, ConfigSection};
use crate::error::Result;
use crate::writer::{RustModule, RustWriter};
use std::rc::Rc;

pub fn config_module() -> RustModule {
    RustModule::public("config").with_documentation("Configuration for the service.")
}

/// Renders `Config` and its `Builder`.
pub struct ConfigGenerator<'a> {
    customizations: &'a [Rc<dyn ConfigCustomization>],
}

impl<'a> ConfigGenerator<'a> {
    pub fn new(customizations: &'a [Rc<dyn ConfigCustomization>]) -> Self {
        Self { customizations }
    }

    fn sections(&self, w: &mut RustWriter, section: ConfigSection) -> Result<()> {
        for customization in self.customizations {
            customization.section(section).write_to(w)?;
        }
        Ok(())
    }

    pub fn render(&self, w: &mut RustWriter) -> Result<()> {
        w.docs("Service configuration.");
        w.rust("#[derive(Debug, Clone)]");
        w.rust_block("pub struct Config", |w| {
            self.sections(w, ConfigSection::ConfigStruct)
        })?;
        w.rust_block("impl Config", |w| {
            w.rust(
                r#"
                /// Constructs a config builder.
                pub fn builder() -> Builder {
                    Builder::default()
                }
                "#,
            );
            self.sections(w, ConfigSection::ConfigImpl)
        })?;

        w.docs("Builder for creating a `Config`.");
        w.rust("#[derive(Debug, Clone, Default)]");
        w.rust_block("pub struct Builder", |w| {
            self.sections(w, ConfigSection::BuilderStruct)
        })?;
        w.rust_block("impl Builder", |w| {
            w.rust(
                r#"
                /// Constructs a config builder.
                pub fn new() -> Self {
                    Self::default()
                }
                "#,
            );
            self.sections(w, ConfigSection::BuilderImpl)?;
            w.docs("Builds a [`Config`].");
            w.rust_block("pub fn build(self) -> Config", |w| {
                w.rust_block("Config", |w| self.sections(w, ConfigSection::BuilderBuild))
            })
        })
    }
}
