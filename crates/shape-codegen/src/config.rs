//! Codegen settings, read from the plugin section of a `smithy-build.json`-style file.
//!
//! ```json
//! {
//!   "service": "com.amazonaws.transcribestreaming#Transcribe",
//!   "moduleName": "transcribe-streaming",
//!   "codegen": { "target": "client", "debugMode": false },
//!   "runtimeConfig": { "version": "1" }
//! }
//! ```

use crate::error::{CodegenError, Result};
use crate::model::ShapeId;
use crate::symbol::{CargoDependency, RuntimeType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which side of the protocol is being generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodegenTarget {
    #[default]
    Client,
    Server,
}

impl CodegenTarget {
    /// Clients tolerate event variants they do not know about; servers reject them.
    pub fn render_unknown_variant(self) -> bool {
        matches!(self, CodegenTarget::Client)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenSettings {
    pub service: ShapeId,
    pub module_name: String,
    #[serde(default = "default_module_version")]
    pub module_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_description: Option<String>,
    #[serde(default)]
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub runtime_config: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodegenConfig {
    pub target: CodegenTarget,
    pub include_banner: bool,
    pub debug_mode: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            target: CodegenTarget::Client,
            include_banner: true,
            debug_mode: false,
        }
    }
}

/// Where the generated code's runtime crates come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    pub event_stream_crate: String,
    pub http_crate: String,
    pub types_crate: String,
    pub version: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_stream_crate: "aws-smithy-eventstream".to_string(),
            http_crate: "aws-smithy-http".to_string(),
            types_crate: "aws-smithy-types".to_string(),
            version: "1".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn event_stream(&self) -> RuntimeType {
        CargoDependency::new(&self.event_stream_crate, &self.version).to_type()
    }

    pub fn http(&self) -> RuntimeType {
        CargoDependency::new(&self.http_crate, &self.version).to_type()
    }

    pub fn smithy_types(&self) -> RuntimeType {
        CargoDependency::new(&self.types_crate, &self.version).to_type()
    }

    pub fn blob(&self) -> RuntimeType {
        self.smithy_types().resolve("Blob")
    }

    pub fn date_time(&self) -> RuntimeType {
        self.smithy_types().resolve("DateTime")
    }

    /// `tracing` as used by generated code.
    pub fn tracing(&self) -> RuntimeType {
        CargoDependency::new("tracing", "0.1").to_type()
    }
}

fn default_module_version() -> String {
    "0.1.0".to_string()
}

impl CodegenSettings {
    pub fn new(service: ShapeId, module_name: impl Into<String>) -> Self {
        Self {
            service,
            module_name: module_name.into(),
            module_version: default_module_version(),
            module_description: None,
            codegen: CodegenConfig::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    pub fn with_target(mut self, target: CodegenTarget) -> Self {
        self.codegen.target = target;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn target(&self) -> CodegenTarget {
        self.codegen.target
    }

    fn validate(&self) -> Result<()> {
        if self.module_name.trim().is_empty() {
            return Err(CodegenError::InvalidSettings(
                "`moduleName` must not be empty".to_string(),
            ));
        }
        if self.runtime_config.version.trim().is_empty() {
            return Err(CodegenError::InvalidSettings(
                "`runtimeConfig.version` must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CodegenSettings::from_json_str(
            r#"{ "service": "com.example#Svc", "moduleName": "example" }"#,
        )
        .unwrap();
        assert_eq!(settings.service.name(), "Svc");
        assert_eq!(settings.module_version, "0.1.0");
        assert_eq!(settings.target(), CodegenTarget::Client);
        assert!(settings.codegen.include_banner);
        assert!(!settings.codegen.debug_mode);
        assert_eq!(settings.runtime_config, RuntimeConfig::default());
    }

    #[test]
    fn test_server_target_and_runtime_override() {
        let settings = CodegenSettings::from_json_str(
            r#"{
                "service": "com.example#Svc",
                "moduleName": "example-server",
                "codegen": { "target": "server", "includeBanner": false },
                "runtimeConfig": { "typesCrate": "my-types", "version": "2" }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.target(), CodegenTarget::Server);
        assert!(!settings.codegen.include_banner);
        assert_eq!(settings.runtime_config.blob().path(), "my_types::Blob");
        assert_eq!(settings.runtime_config.event_stream_crate, "aws-smithy-eventstream");
    }

    #[test]
    fn test_rejects_unknown_target() {
        let err = CodegenSettings::from_json_str(
            r#"{ "service": "ns#Svc", "moduleName": "x", "codegen": { "target": "lambda" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CodegenError::Json(_)));
    }

    #[test]
    fn test_rejects_bad_service_and_empty_module() {
        assert!(
            CodegenSettings::from_json_str(r#"{ "service": "Svc", "moduleName": "x" }"#).is_err()
        );
        let err = CodegenSettings::from_json_str(r#"{ "service": "ns#Svc", "moduleName": " " }"#)
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidSettings(_)));
    }

    #[test]
    fn test_round_trip() {
        let settings = CodegenSettings::new(ShapeId::parse("ns#Svc").unwrap(), "svc")
            .with_target(CodegenTarget::Server);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains(r#""moduleName":"svc""#));
        assert_eq!(CodegenSettings::from_json_str(&json).unwrap(), settings);
    }
}
