//! Symbols and runtime types: how shapes and runtime items are referenced from
//! generated code, and which crate dependencies they drag in.

use crate::config::{CodegenTarget, RuntimeConfig};
use crate::error::Result;
use crate::model::{Model, PrimitiveKind, Shape, ShapeKind, TraitKind};
use crate::naming::{escape_if_needed, to_pascal_case, to_snake_case};
use crate::writer::{RustModule, Writable};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A crates.io dependency of the generated crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CargoDependency {
    name: String,
    version: String,
}

impl CargoDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name as written in Rust paths: `aws-smithy-types` -> `aws_smithy_types`.
    pub fn rust_name(&self) -> String {
        self.name.replace('-', "_")
    }

    /// The crate root as a runtime type.
    pub fn to_type(&self) -> RuntimeType {
        RuntimeType {
            path: self.rust_name(),
            dependency: Some(Dependency::Cargo(self.clone())),
        }
    }
}

/// Generated code rendered into `module` the first time anything references it.
#[derive(Clone)]
pub struct InlineDependency {
    key: String,
    module: RustModule,
    writable: Writable,
}

impl InlineDependency {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn module(&self) -> &RustModule {
        &self.module
    }

    pub fn writable(&self) -> &Writable {
        &self.writable
    }
}

// Identity of an inline dependency is its key.
impl PartialEq for InlineDependency {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for InlineDependency {}

impl PartialOrd for InlineDependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InlineDependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for InlineDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineDependency")
            .field("key", &self.key)
            .field("module", &self.module.full_path())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dependency {
    Cargo(CargoDependency),
    Inline(InlineDependency),
}

/// A path to an item outside the shape model: a runtime crate item or a generated
/// helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeType {
    path: String,
    dependency: Option<Dependency>,
}

impl RuntimeType {
    /// A type that needs no dependency (std items, or paths into the crate itself).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dependency: None,
        }
    }

    /// A generated item named `name` in `module`, written by `writable` on first use.
    pub fn for_inline_fun(name: &str, module: RustModule, writable: Writable) -> Self {
        let path = format!("{}::{}", module.full_path(), name);
        Self {
            path: path.clone(),
            dependency: Some(Dependency::Inline(InlineDependency {
                key: path,
                module,
                writable,
            })),
        }
    }

    /// A child item: `aws_smithy_types` -> `aws_smithy_types::Blob`.
    pub fn resolve(&self, child: &str) -> Self {
        Self {
            path: format!("{}::{}", self.path, child),
            dependency: self.dependency.clone(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }

    pub fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A shape as seen from generated Rust code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    namespace: String,
    rust_type: String,
    optional: bool,
    dependencies: Vec<Dependency>,
    references: Vec<Symbol>,
}

impl Symbol {
    /// A named type: `crate::types` + `Person` renders as `crate::types::Person`.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let rust_type = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{namespace}::{name}")
        };
        Self {
            name,
            namespace,
            rust_type,
            optional: false,
            dependencies: Vec::new(),
            references: Vec::new(),
        }
    }

    /// A builtin type such as `i32` or `::std::string::String`.
    pub fn builtin(rust_type: impl Into<String>) -> Self {
        Self::new(rust_type, "")
    }

    /// A symbol for a runtime type, carrying its dependency.
    pub fn from_runtime_type(runtime_type: &RuntimeType) -> Self {
        let (namespace, name) = runtime_type
            .path()
            .rsplit_once("::")
            .unwrap_or(("", runtime_type.path()));
        let mut symbol = Self::new(name, namespace);
        symbol.dependencies.extend(runtime_type.dependency().cloned());
        symbol
    }

    /// `::std::option::Option<T>`
    pub fn option(inner: Symbol) -> Self {
        let mut symbol = Self::wrap("::std::option::Option", inner);
        symbol.optional = true;
        symbol
    }

    /// `::std::vec::Vec<T>`
    pub fn vec(inner: Symbol) -> Self {
        Self::wrap("::std::vec::Vec", inner)
    }

    /// `::std::collections::HashMap<K, V>`
    pub fn hash_map(key: Symbol, value: Symbol) -> Self {
        let rust_type = format!(
            "::std::collections::HashMap<{}, {}>",
            key.rust_type, value.rust_type
        );
        Self {
            name: "HashMap".into(),
            namespace: "::std::collections".into(),
            rust_type,
            optional: false,
            dependencies: Vec::new(),
            references: vec![key, value],
        }
    }

    fn wrap(outer: &str, inner: Symbol) -> Self {
        let (namespace, name) = outer.rsplit_once("::").unwrap_or(("", outer));
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            rust_type: format!("{outer}<{}>", inner.rust_type),
            optional: false,
            dependencies: Vec::new(),
            references: vec![inner],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fully qualified rendering, as written into generated code.
    pub fn rust_type(&self) -> &str {
        &self.rust_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn references(&self) -> &[Symbol] {
        &self.references
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rust_type)
    }
}

/// Maps shapes to Rust symbols and member names.
pub trait SymbolProvider {
    fn to_symbol(&self, shape: &Shape) -> Result<Symbol>;

    /// Field name for structure members, variant name for union members.
    fn to_member_name(&self, member: &Shape) -> String;
}

/// The default symbol provider.
///
/// - structures, unions and enums go to `crate::types` (errors to `crate::types::error`)
/// - operations go to `crate::operation::<snake_name>`
/// - standalone constrained primitives go to `crate::model` on server targets
pub struct RustSymbolProvider {
    model: Rc<Model>,
    runtime: RuntimeConfig,
    target: CodegenTarget,
}

impl RustSymbolProvider {
    pub fn new(model: Rc<Model>, runtime: RuntimeConfig, target: CodegenTarget) -> Self {
        Self {
            model,
            runtime,
            target,
        }
    }

    fn primitive_symbol(&self, shape: &Shape, kind: PrimitiveKind) -> Symbol {
        if self.target == CodegenTarget::Server && shape.traits().any(|t| t.is_constraint()) {
            return Symbol::new(to_pascal_case(shape.id().name()), "crate::model");
        }
        match kind {
            PrimitiveKind::Blob => Symbol::from_runtime_type(&self.runtime.blob()),
            PrimitiveKind::Timestamp => Symbol::from_runtime_type(&self.runtime.date_time()),
            PrimitiveKind::Boolean => Symbol::builtin("bool"),
            PrimitiveKind::String => Symbol::builtin("::std::string::String"),
            PrimitiveKind::Byte => Symbol::builtin("i8"),
            PrimitiveKind::Short => Symbol::builtin("i16"),
            PrimitiveKind::Integer => Symbol::builtin("i32"),
            PrimitiveKind::Long => Symbol::builtin("i64"),
            PrimitiveKind::Float => Symbol::builtin("f32"),
            PrimitiveKind::Double => Symbol::builtin("f64"),
        }
    }

    fn member_symbol(&self, member: &Shape) -> Result<Symbol> {
        let target = self.model.member_target(member)?;
        let symbol = self.to_symbol(target)?;
        let container = self.model.expect_shape(&member.id().root())?;
        if container.is_structure() && !member.has_trait(TraitKind::Required) {
            Ok(Symbol::option(symbol))
        } else {
            Ok(symbol)
        }
    }
}

impl SymbolProvider for RustSymbolProvider {
    fn to_symbol(&self, shape: &Shape) -> Result<Symbol> {
        let type_name = || escape_if_needed(&to_pascal_case(shape.id().name()));
        match shape.kind() {
            ShapeKind::Structure { .. } if shape.is_error() => {
                Ok(Symbol::new(type_name(), "crate::types::error"))
            }
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } | ShapeKind::Enum { .. } => {
                Ok(Symbol::new(type_name(), "crate::types"))
            }
            ShapeKind::List { member } => {
                let member = self.model.expect_shape(member)?;
                Ok(Symbol::vec(self.member_symbol(member)?))
            }
            ShapeKind::Map { key, value } => {
                let key = self.member_symbol(self.model.expect_shape(key)?)?;
                let value = self.member_symbol(self.model.expect_shape(value)?)?;
                Ok(Symbol::hash_map(key, value))
            }
            ShapeKind::Primitive(kind) => Ok(self.primitive_symbol(shape, *kind)),
            ShapeKind::Operation { .. } => Ok(Symbol::new(
                type_name(),
                format!("crate::operation::{}", to_snake_case(shape.id().name())),
            )),
            ShapeKind::Service { .. } => Ok(Symbol::new(type_name(), "crate")),
            ShapeKind::Member { .. } => self.member_symbol(shape),
        }
    }

    fn to_member_name(&self, member: &Shape) -> String {
        let name = member.member_name().unwrap_or(member.id().name());
        let in_union = self
            .model
            .get(&member.id().root())
            .is_some_and(Shape::is_union);
        if in_union {
            escape_if_needed(&to_pascal_case(name))
        } else {
            escape_if_needed(&to_snake_case(name))
        }
    }
}

/// The builder type generated alongside a structure: `crate::types::builders::FooBuilder`.
pub fn builder_symbol(symbol: &Symbol) -> Symbol {
    Symbol::new(
        format!("{}Builder", symbol.name()),
        format!("{}::builders", symbol.namespace()),
    )
}

/// Setter used on builders: `set_<field>`.
pub fn setter_name(field: &str) -> String {
    format!("set_{}", field.trim_start_matches("r#"))
}
