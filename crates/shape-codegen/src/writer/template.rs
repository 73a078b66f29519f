//! `#{key}` template directives.
//!
//! Rendering happens in two passes. The first pass validates every directive against
//! the active scopes (case-insensitively) and rewrites it into the canonical form
//! `#{lowercase_key:K}`. The second pass substitutes canonical directives using the
//! nearest scope that binds the key. `##` is a literal `#` in both passes.

use crate::error::{CodegenError, Result};
use crate::symbol::{RuntimeType, Symbol};
use crate::writer::Writable;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##|#\{([a-zA-Z_0-9]+)(:\w)?\}").expect("directive pattern is a valid regex")
});

pub(crate) static CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##|#\{([a-z_0-9]+):(\w)\}").expect("canonical pattern is a valid regex")
});

/// A value bound to a template key.
#[derive(Debug, Clone)]
pub enum TemplateArg {
    Symbol(Symbol),
    RuntimeType(RuntimeType),
    /// Emitted verbatim.
    Literal(String),
    Writable(Writable),
}

impl From<Symbol> for TemplateArg {
    fn from(symbol: Symbol) -> Self {
        TemplateArg::Symbol(symbol)
    }
}

impl From<&Symbol> for TemplateArg {
    fn from(symbol: &Symbol) -> Self {
        TemplateArg::Symbol(symbol.clone())
    }
}

impl From<RuntimeType> for TemplateArg {
    fn from(runtime_type: RuntimeType) -> Self {
        TemplateArg::RuntimeType(runtime_type)
    }
}

impl From<&RuntimeType> for TemplateArg {
    fn from(runtime_type: &RuntimeType) -> Self {
        TemplateArg::RuntimeType(runtime_type.clone())
    }
}

impl From<&str> for TemplateArg {
    fn from(literal: &str) -> Self {
        TemplateArg::Literal(literal.to_string())
    }
}

impl From<String> for TemplateArg {
    fn from(literal: String) -> Self {
        TemplateArg::Literal(literal)
    }
}

impl From<Writable> for TemplateArg {
    fn from(writable: Writable) -> Self {
        TemplateArg::Writable(writable)
    }
}

/// One level of the writer's template scope stack.
#[derive(Debug, Clone, Default)]
pub(crate) struct TemplateScope {
    // (lowercased key, key as written, value)
    entries: Vec<(String, String, TemplateArg)>,
}

impl TemplateScope {
    pub(crate) fn new(args: &[(&str, TemplateArg)]) -> Result<Self> {
        let mut entries: Vec<(String, String, TemplateArg)> = Vec::with_capacity(args.len());
        for (key, value) in args {
            let lower = key.to_lowercase();
            if entries.iter().any(|(existing, _, _)| *existing == lower) {
                return Err(CodegenError::DuplicateTemplateKey {
                    key: key.to_string(),
                });
            }
            entries.push((lower, key.to_string(), value.clone()));
        }
        Ok(Self { entries })
    }

    fn get(&self, lower_key: &str) -> Option<&TemplateArg> {
        self.entries
            .iter()
            .find(|(key, _, _)| key == lower_key)
            .map(|(_, _, value)| value)
    }
}

/// The binding for `lower_key` in the nearest scope.
pub(crate) fn lookup<'a>(scopes: &'a [TemplateScope], lower_key: &str) -> Option<&'a TemplateArg> {
    scopes.iter().rev().find_map(|scope| scope.get(lower_key))
}

/// First pass: validate directives and rewrite them to `#{lowercase_key:K}`.
pub(crate) fn canonicalize(template: &str, scopes: &[TemplateScope]) -> Result<String> {
    let mut missing = None;
    let canonical = DIRECTIVE.replace_all(template, |caps: &Captures<'_>| {
        let Some(key) = caps.get(1) else {
            return "##".to_string();
        };
        let lower = key.as_str().to_lowercase();
        if lookup(scopes, &lower).is_none() && missing.is_none() {
            missing = Some(key.as_str().to_string());
        }
        let kind = caps.get(2).map_or(":T", |k| k.as_str());
        format!("#{{{lower}{kind}}}")
    });

    if let Some(key) = missing {
        let available = scopes
            .iter()
            .flat_map(|scope| scope.entries.iter().map(|(_, key, _)| key.clone()))
            .collect();
        return Err(CodegenError::missing_key(&key, available));
    }
    Ok(canonical.into_owned())
}

/// Strip the common leading indentation, plus a blank first and last line.
///
/// Lets multi-line templates be written as indented raw strings.
pub fn trim_indent(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 && lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.len() > 1 && lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or(l.trim_start()).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
