use crate::config::{CodegenSettings, CodegenTarget, RuntimeConfig};
use crate::error::{CodegenError, Result};
use crate::model::{Model, Shape, ShapeId, ShapeKind};
use crate::symbol::{RustSymbolProvider, SymbolProvider};
use std::rc::Rc;

/// Everything a generator needs to know about the current run.
#[derive(Clone)]
pub struct CodegenContext {
    model: Rc<Model>,
    settings: CodegenSettings,
    symbol_provider: Rc<dyn SymbolProvider>,
}

impl CodegenContext {
    /// Build a context for `settings.service`, which must be a service shape in `model`.
    pub fn new(model: Rc<Model>, settings: CodegenSettings) -> Result<Self> {
        let service = model.expect_shape(&settings.service)?;
        if !matches!(service.kind(), ShapeKind::Service { .. }) {
            return Err(CodegenError::UnexpectedShapeKind {
                id: settings.service.clone(),
                expected: "service",
            });
        }
        let symbol_provider = Rc::new(RustSymbolProvider::new(
            model.clone(),
            settings.runtime_config.clone(),
            settings.target(),
        ));
        Ok(Self {
            model,
            settings,
            symbol_provider,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn service_id(&self) -> &ShapeId {
        &self.settings.service
    }

    pub fn service_shape(&self) -> Result<&Shape> {
        self.model.expect_shape(&self.settings.service)
    }

    pub fn settings(&self) -> &CodegenSettings {
        &self.settings
    }

    pub fn target(&self) -> CodegenTarget {
        self.settings.target()
    }

    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.settings.runtime_config
    }

    pub fn symbol_provider(&self) -> &dyn SymbolProvider {
        self.symbol_provider.as_ref()
    }
}
