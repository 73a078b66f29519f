//! Error types for the code generator.

use crate::model::ShapeId;
use thiserror::Error;

/// Errors raised while transforming a model or rendering generated code.
///
/// Every variant is fatal for the generation run.
#[derive(Debug, Error)]
pub enum CodegenError {
    // Template errors
    #[error("template references `#{{{key}}}` but nothing is bound to it (bound keys: {available:?})")]
    MissingTemplateKey { key: String, available: Vec<String> },

    #[error("template key `{key}` is bound more than once in the same scope (keys are case-insensitive)")]
    DuplicateTemplateKey { key: String },

    #[error("template argument `{key}` cannot be rendered with `:{kind}`, expected {expected}")]
    InvalidTemplateArgument {
        key: String,
        kind: char,
        expected: &'static str,
    },

    #[error("can only write into modules within the crate, got namespace `{namespace}` for `{file}`")]
    NamespaceOutsideCrate { file: String, namespace: String },

    #[error("no generated file at `{0}`")]
    UnknownFile(String),

    // Model integrity
    #[error("invalid shape id `{0}`")]
    InvalidShapeId(String),

    #[error("expected shape `{0}` to be present in the model")]
    MissingShape(ShapeId),

    #[error("shape `{from}` references `{to}`, which is not in the model")]
    DanglingReference { from: ShapeId, to: ShapeId },

    #[error("expected `{id}` to be a {expected} shape")]
    UnexpectedShapeKind { id: ShapeId, expected: &'static str },

    #[error("constraint traits on `{member}` cannot be extracted: target `{target}` is not a buildable shape")]
    UnbuildableConstrainedTarget { member: ShapeId, target: ShapeId },

    #[error("a unique name for the refactored structure type could not be generated for `{member}`")]
    RefactoredNameExhausted { member: ShapeId },

    #[error("event stream header `{member}` targets `{target}`, which cannot be read from a frame header")]
    UnsupportedEventHeader { member: ShapeId, target: ShapeId },

    // Pipeline
    #[error("decorator `{decorator}` failed: {source}")]
    Decorator {
        decorator: String,
        #[source]
        source: Box<CodegenError>,
    },

    #[error("service `{service}` uses protocol {protocol:?}, which has no registered generator")]
    UnsupportedProtocol {
        service: ShapeId,
        protocol: Option<String>,
    },

    #[error("invalid codegen settings: {0}")]
    InvalidSettings(String),

    /// Free-form failure raised by third-party decorators.
    #[error("{0}")]
    Custom(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

impl CodegenError {
    pub(crate) fn missing_key(key: &str, mut available: Vec<String>) -> Self {
        available.sort();
        available.dedup();
        CodegenError::MissingTemplateKey {
            key: key.to_string(),
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_lists_sorted_keys() {
        let err = CodegenError::missing_key(
            "Output",
            vec!["error".into(), "Blob".into(), "error".into()],
        );
        let message = err.to_string();
        assert!(message.contains("`#{Output}`"));
        assert!(message.contains(r#"["Blob", "error"]"#));
    }

    #[test]
    fn test_decorator_error_keeps_source() {
        use std::error::Error as _;

        let err = CodegenError::Decorator {
            decorator: "Retryable".into(),
            source: Box::new(CodegenError::Custom("boom".into())),
        };
        assert!(err.to_string().contains("`Retryable`"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
