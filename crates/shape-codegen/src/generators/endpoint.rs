use crate::decorator::{EndpointCustomization, EndpointSection};
use crate::error::Result;
use crate::generators::config_module;
use crate::symbol::Symbol;
use crate::writer::{RustModule, RustWriter};
use std::rc::Rc;

pub fn endpoint_module() -> RustModule {
    RustModule::public("endpoint").with_documentation("Endpoint resolution parameters.")
}

/// Renders the endpoint `Params` struct.
pub struct EndpointGenerator<'a> {
    customizations: &'a [Rc<dyn EndpointCustomization>],
}

impl<'a> EndpointGenerator<'a> {
    pub fn new(customizations: &'a [Rc<dyn EndpointCustomization>]) -> Self {
        Self { customizations }
    }

    fn sections(&self, w: &mut RustWriter, section: EndpointSection) -> Result<()> {
        for customization in self.customizations {
            customization.section(section).write_to(w)?;
        }
        Ok(())
    }

    pub fn render(&self, w: &mut RustWriter) -> Result<()> {
        let config = Symbol::new("Config", config_module().full_path());
        w.docs("Parameters used to resolve the endpoint of a request.");
        w.rust("#[non_exhaustive]");
        w.rust("#[derive(Debug, Clone, PartialEq)]");
        w.rust_block("pub struct Params", |w| {
            self.sections(w, EndpointSection::ParamsStruct)
        })?;
        w.rust_block("impl Params", |w| {
            w.docs("Derives endpoint parameters from the service config.");
            w.rust("#[allow(unused_variables)]");
            w.rust_block_template(
                "pub fn from_config(config: &#{Config}) -> Self",
                &[("Config", (&config).into())],
                |w| w.rust_block("Self", |w| self.sections(w, EndpointSection::ParamsFromConfig)),
            )
        })
    }
}
