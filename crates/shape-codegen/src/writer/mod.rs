//! The Rust source writer.
//!
//! [`RustWriter`] accumulates the text of one file (or one inline module), tracking
//! indentation, `use` declarations, child module declarations, and every dependency
//! referenced through symbols, runtime types, and writables.

mod module;
mod rust_crate;
mod template;
mod writable;

pub use module::{RustModule, Visibility};
pub use rust_crate::RustCrate;
pub use template::{TemplateArg, trim_indent};
pub use writable::{Writable, writable};

use crate::error::{CodegenError, Result};
use crate::model::{Model, PrimitiveKind, Shape, ShapeId, ShapeKind, Trait, TraitKind};
use crate::symbol::{CargoDependency, Dependency, InlineDependency, RuntimeType, Symbol};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::Location;
use std::rc::Rc;
use template::{CANONICAL, TemplateScope, canonicalize, lookup};

/// First line of every generated file.
pub const BANNER: &str = "// Code generated by shape-codegen. DO NOT EDIT.";

const INDENT: &str = "    ";

pub struct RustWriter {
    file_name: String,
    namespace: String,
    print_banner: bool,
    debug_mode: bool,

    body: String,
    indent_level: usize,
    at_line_start: bool,

    dependencies: BTreeSet<Dependency>,
    use_declarations: BTreeSet<String>,
    // module name -> rendered declaration (docs + `mod name;`)
    module_declarations: BTreeMap<String, String>,

    scopes: Vec<TemplateScope>,
    // rendered when registered so their dependencies land in this writer
    preamble: Vec<String>,
    // shared with every child writer of the same file
    counter: Rc<Cell<usize>>,
}

impl RustWriter {
    /// A writer for `file_name` whose code lives in `namespace`.
    ///
    /// Rust files must be written into the crate (`crate` or `crate::..`), except for
    /// integration tests and build scripts.
    pub fn new(file_name: impl Into<String>, namespace: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        let namespace = namespace.into();
        let in_crate = namespace == "crate" || namespace.starts_with("crate::");
        let exempt = file_name.starts_with("tests/") || file_name == "build.rs";
        if file_name.ends_with(".rs") && !in_crate && !exempt {
            return Err(CodegenError::NamespaceOutsideCrate {
                file: file_name,
                namespace,
            });
        }
        Ok(Self::unchecked(file_name, namespace))
    }

    /// Writer for `src/lib.rs`.
    pub fn root() -> Self {
        Self::unchecked("src/lib.rs".to_string(), "crate".to_string())
    }

    /// Writer for the file owning `module`.
    pub fn for_module(module: &RustModule) -> Self {
        let owner = module.file_owner();
        Self::unchecked(owner.file_path(), owner.full_path())
    }

    fn unchecked(file_name: String, namespace: String) -> Self {
        Self {
            file_name,
            namespace,
            print_banner: true,
            debug_mode: false,
            body: String::new(),
            indent_level: 0,
            at_line_start: true,
            dependencies: BTreeSet::new(),
            use_declarations: BTreeSet::new(),
            module_declarations: BTreeMap::new(),
            scopes: Vec::new(),
            preamble: Vec::new(),
            counter: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_banner(mut self, print_banner: bool) -> Self {
        self.print_banner = print_banner;
        self
    }

    /// Precede written code with a `/* file:line */` marker of the generator call site.
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// A writer for a fragment of this file: same file, no banner, same scopes.
    fn child(&self, namespace: String) -> Self {
        let mut child = Self::unchecked(self.file_name.clone(), namespace);
        child.print_banner = false;
        child.debug_mode = self.debug_mode;
        child.scopes = self.scopes.clone();
        child.counter = Rc::clone(&self.counter);
        child
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn dependencies(&self) -> &BTreeSet<Dependency> {
        &self.dependencies
    }

    pub fn cargo_dependencies(&self) -> impl Iterator<Item = &CargoDependency> {
        self.dependencies.iter().filter_map(|dep| match dep {
            Dependency::Cargo(cargo) => Some(cargo),
            Dependency::Inline(_) => None,
        })
    }

    pub(crate) fn inline_dependencies(&self) -> impl Iterator<Item = &InlineDependency> {
        self.dependencies.iter().filter_map(|dep| match dep {
            Dependency::Inline(inline) => Some(inline),
            Dependency::Cargo(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty() && self.module_declarations.is_empty()
    }

    // ── Raw emission ──

    fn emit(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            if line.is_empty() {
                continue;
            }
            if self.at_line_start {
                for _ in 0..self.indent_level {
                    self.body.push_str(INDENT);
                }
                self.at_line_start = false;
            }
            self.body.push_str(line);
        }
    }

    fn newline(&mut self) {
        self.body.push('\n');
        self.at_line_start = true;
    }

    fn ensure_newline(&mut self) {
        if !self.at_line_start {
            self.newline();
        }
    }

    fn debug_marker(&mut self, location: &Location<'_>) {
        if self.debug_mode && self.at_line_start {
            self.emit(&format!("/* {}:{} */", location.file(), location.line()));
            self.newline();
        }
    }

    // ── Text ──

    /// Write `text` (dedented) followed by a newline.
    #[track_caller]
    pub fn rust(&mut self, text: &str) -> &mut Self {
        self.debug_marker(Location::caller());
        self.emit(&trim_indent(text));
        self.newline();
        self
    }

    /// Write `text` without a trailing newline.
    pub fn rust_inline(&mut self, text: &str) -> &mut Self {
        self.emit(&trim_indent(text));
        self
    }

    /// Render `template` against `args` (and every enclosing scope) and write it.
    #[track_caller]
    pub fn rust_template(&mut self, template: &str, args: &[(&str, TemplateArg)]) -> Result<()> {
        let location = Location::caller();
        let rendered = self.with_scope(args, |w| w.format_template(template))?;
        self.debug_marker(location);
        self.emit(&rendered);
        self.newline();
        Ok(())
    }

    /// Like [`RustWriter::rust_template`] without the trailing newline.
    pub fn rust_inline_template(
        &mut self,
        template: &str,
        args: &[(&str, TemplateArg)],
    ) -> Result<()> {
        let rendered = self.with_scope(args, |w| w.format_template(template))?;
        self.emit(&rendered);
        Ok(())
    }

    /// Bind `args` for every template rendered inside `f`.
    pub fn with_template_scope<T>(
        &mut self,
        args: &[(&str, TemplateArg)],
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_scope(args, f)
    }

    fn with_scope<T>(
        &mut self,
        args: &[(&str, TemplateArg)],
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.scopes.push(TemplateScope::new(args)?);
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn format_template(&mut self, template: &str) -> Result<String> {
        let canonical = canonicalize(&trim_indent(template), &self.scopes)?;
        let mut out = String::with_capacity(canonical.len());
        let mut last = 0;
        for caps in CANONICAL.captures_iter(&canonical) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&canonical[last..whole.start()]);
            last = whole.end();

            match (caps.get(1), caps.get(2)) {
                (Some(key), Some(kind)) => {
                    let arg = lookup(&self.scopes, key.as_str())
                        .cloned()
                        .ok_or_else(|| CodegenError::missing_key(key.as_str(), Vec::new()))?;
                    let kind = kind.as_str().chars().next().unwrap_or('T');
                    let rendered = self.render_arg(key.as_str(), kind, arg)?;
                    out.push_str(&indent_continuation(&rendered, line_indent(&out)));
                }
                _ => out.push('#'),
            }
        }
        out.push_str(&canonical[last..]);
        Ok(out)
    }

    fn render_arg(&mut self, key: &str, kind: char, arg: TemplateArg) -> Result<String> {
        let invalid = |expected| CodegenError::InvalidTemplateArgument {
            key: key.to_string(),
            kind,
            expected,
        };
        match (kind, arg) {
            ('T', TemplateArg::Symbol(symbol)) => Ok(self.format_symbol(&symbol)),
            ('T', TemplateArg::RuntimeType(rt)) => Ok(self.format_runtime_type(&rt)),
            ('T', TemplateArg::Literal(text)) => Ok(text),
            ('T' | 'W', TemplateArg::Writable(w)) => self.render_writable(&w),
            ('W', _) => Err(invalid("a writable")),
            ('D', TemplateArg::Symbol(symbol)) => {
                let path = self.format_symbol(&symbol);
                Ok(format!("[`{}`]({path})", symbol.name()))
            }
            ('D', TemplateArg::RuntimeType(rt)) => {
                let path = self.format_runtime_type(&rt);
                Ok(format!("[`{}`]({path})", rt.name()))
            }
            ('D', _) => Err(invalid("a symbol or runtime type")),
            _ => Err(invalid("one of `:T`, `:W`, `:D`")),
        }
    }

    fn render_writable(&mut self, writable: &Writable) -> Result<String> {
        let mut child = self.child(self.namespace.clone());
        writable.write_to(&mut child)?;
        self.merge_from(&child);
        Ok(child.body.trim_end_matches('\n').to_string())
    }

    fn merge_from(&mut self, other: &RustWriter) {
        self.dependencies.extend(other.dependencies.iter().cloned());
        self.use_declarations
            .extend(other.use_declarations.iter().cloned());
        for (name, decl) in &other.module_declarations {
            self.module_declarations
                .entry(name.clone())
                .or_insert_with(|| decl.clone());
        }
    }

    // ── Blocks ──

    pub fn open_block(&mut self, header: &str) -> &mut Self {
        if !header.is_empty() {
            self.emit(header);
            self.newline();
        }
        self.indent_level += 1;
        self
    }

    pub fn close_block(&mut self, footer: &str) -> &mut Self {
        self.ensure_newline();
        self.indent_level = self.indent_level.saturating_sub(1);
        if !footer.is_empty() {
            self.emit(footer);
            self.newline();
        }
        self
    }

    /// `header {` .. `}`
    #[track_caller]
    pub fn rust_block(
        &mut self,
        header: &str,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.debug_marker(Location::caller());
        let header = trim_indent(header);
        self.with_block(&block_open(&header), "}", body)
    }

    #[track_caller]
    pub fn rust_block_template(
        &mut self,
        header: &str,
        args: &[(&str, TemplateArg)],
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.debug_marker(Location::caller());
        self.with_scope(args, |w| {
            let header = w.format_template(header)?;
            w.with_block(&block_open(&header), "}", body)
        })
    }

    /// Write `before`, run `body` one level deeper, then write `after`.
    pub fn with_block(
        &mut self,
        before: &str,
        after: &str,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.open_block(before.trim());
        let result = body(self);
        self.close_block(after.trim());
        result
    }

    pub fn with_block_template(
        &mut self,
        before: &str,
        after: &str,
        args: &[(&str, TemplateArg)],
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.with_scope(args, |w| {
            let before = w.format_template(before)?;
            let after = w.format_template(after)?;
            w.with_block(&before, &after, body)
        })
    }

    /// [`RustWriter::with_block`] when `conditional` holds; otherwise just `body`.
    pub fn conditional_block(
        &mut self,
        before: &str,
        after: &str,
        conditional: bool,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        if conditional {
            self.with_block(before, after, body)
        } else {
            body(self)
        }
    }

    // ── Docs ──

    /// `///` documentation, one line per input line.
    pub fn docs(&mut self, text: &str) -> &mut Self {
        self.prefixed_lines("///", text)
    }

    /// `//!` documentation for the enclosing module.
    pub fn container_docs(&mut self, text: &str) -> &mut Self {
        self.prefixed_lines("//!", text)
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.prefixed_lines("//", text)
    }

    fn prefixed_lines(&mut self, prefix: &str, text: &str) -> &mut Self {
        self.ensure_newline();
        for line in trim_indent(text).split('\n') {
            let line = line.replace('\t', "  ");
            let line = line.trim_end();
            if line.is_empty() {
                self.emit(prefix);
            } else {
                self.emit(&format!("{prefix} {line}"));
            }
            self.newline();
        }
        self
    }

    /// Modeled docs if present, otherwise a `missing_docs` suppression.
    pub fn docs_or_fallback(
        &mut self,
        docs: Option<&str>,
        auto_suppress_missing_docs: bool,
        note: Option<&str>,
    ) -> &mut Self {
        match docs.filter(|d| !d.trim().is_empty()) {
            Some(docs) => {
                self.docs(docs);
                if let Some(note) = note {
                    self.docs("");
                    self.docs(note);
                }
            }
            None => {
                if auto_suppress_missing_docs {
                    self.rust("#[allow(missing_docs)] // documentation missing in model");
                }
                if let Some(note) = note {
                    self.docs(note);
                }
            }
        }
        self
    }

    /// Docs for `shape`; members fall back to their target's docs.
    pub fn document_shape(&mut self, shape: &Shape, model: &Model, note: Option<&str>) -> &mut Self {
        let docs = shape.documentation().or_else(|| {
            shape
                .target()
                .and_then(|target| model.get(target))
                .and_then(Shape::documentation)
        });
        self.docs_or_fallback(docs, true, note)
    }

    /// `#[deprecated(..)]` when the shape carries the deprecated trait.
    pub fn deprecated_shape(&mut self, shape: &Shape) -> &mut Self {
        if let Some(Trait::Deprecated { message, since }) = shape.get_trait(TraitKind::Deprecated) {
            let mut args = Vec::new();
            if let Some(message) = message {
                args.push(format!("note = {message:?}"));
            }
            if let Some(since) = since {
                args.push(format!("since = {since:?}"));
            }
            if args.is_empty() {
                self.rust("#[deprecated]");
            } else {
                self.rust(&format!("#[deprecated({})]", args.join(", ")));
            }
        }
        self
    }

    // ── Symbols and dependencies ──

    /// Record `symbol`'s dependencies and return its fully-qualified rendering.
    pub fn format_symbol(&mut self, symbol: &Symbol) -> String {
        self.add_deps_recursively(symbol);
        symbol.rust_type().to_string()
    }

    pub fn format_runtime_type(&mut self, runtime_type: &RuntimeType) -> String {
        if let Some(dep) = runtime_type.dependency() {
            self.add_dependency(dep.clone());
        }
        runtime_type.path().to_string()
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> &mut Self {
        self.dependencies.insert(dependency);
        self
    }

    pub fn add_deps_recursively(&mut self, symbol: &Symbol) {
        self.dependencies
            .extend(symbol.dependencies().iter().cloned());
        for reference in symbol.references() {
            self.add_deps_recursively(reference);
        }
    }

    /// Record a `use` declaration, e.g. `std::fmt`.
    pub fn add_use(&mut self, path: impl Into<String>) -> &mut Self {
        self.use_declarations.insert(path.into());
        self
    }

    /// Declare a child module of this file (`pub mod name;`).
    pub fn declare_module(&mut self, module: &RustModule) -> &mut Self {
        let mut decl = String::new();
        if let Some(docs) = module.documentation() {
            for line in docs.lines() {
                decl.push_str(&format!("/// {line}\n"));
            }
        }
        decl.push_str(&module.declaration());
        self.module_declarations
            .insert(module.name().to_string(), decl);
        self
    }

    /// A name unique within this writer and every fragment spliced into it:
    /// `prefix_1`, `prefix_2`, ..
    pub fn safe_name(&mut self, prefix: &str) -> String {
        let next = self.counter.get() + 1;
        self.counter.set(next);
        format!("{prefix}_{next}")
    }

    /// Code rendered before the banner.
    ///
    /// The writable runs immediately; its dependencies and imports belong to this writer.
    pub fn first(&mut self, preamble: Writable) -> Result<()> {
        let mut child = self.child(self.namespace.clone());
        preamble.write_to(&mut child)?;
        self.merge_from(&child);
        self.preamble.push(child.body.trim_end().to_string());
        Ok(())
    }

    // ── Value helpers ──

    /// Run `block` on the unwrapped value when `member` is optional, directly otherwise.
    pub fn if_some(
        &mut self,
        member: &Symbol,
        value: &str,
        block: impl FnOnce(&mut Self, &str) -> Result<()>,
    ) -> Result<()> {
        if member.is_optional() {
            let inner = self.safe_name("inner");
            self.rust_block(&format!("if let Some({inner}) = {value}"), |w| {
                block(w, &inner)
            })
        } else {
            block(self, value)
        }
    }

    /// Run `block` only when `variable` differs from the default of `shape`'s type.
    pub fn if_not_default(
        &mut self,
        shape: &Shape,
        variable: &str,
        block: impl FnOnce(&mut Self, &str) -> Result<()>,
    ) -> Result<()> {
        let header = match shape.primitive() {
            Some(PrimitiveKind::Float | PrimitiveKind::Double) => {
                format!("if {variable} != 0.0")
            }
            Some(kind) if kind.is_number() => format!("if {variable} != 0"),
            Some(PrimitiveKind::Boolean) => format!("if {variable}"),
            _ => String::new(),
        };
        self.rust_block(&header, |w| block(w, variable))
    }

    /// [`RustWriter::if_some`] then [`RustWriter::if_not_default`].
    pub fn if_set(
        &mut self,
        shape: &Shape,
        member: &Symbol,
        value: &str,
        block: impl FnOnce(&mut Self, &str) -> Result<()>,
    ) -> Result<()> {
        self.if_some(member, value, |w, inner| w.if_not_default(shape, inner, block))
    }

    /// Iterate a list (items) or map (values) held in `outer_field`.
    ///
    /// `block` receives the loop variable and the id of the element's target shape.
    pub fn list_for_each(
        &mut self,
        model: &Model,
        target: &Shape,
        outer_field: &str,
        block: impl FnOnce(&mut Self, &str, &ShapeId) -> Result<()>,
    ) -> Result<()> {
        match target.kind() {
            ShapeKind::List { member } => {
                let element = model.member_target(model.expect_shape(member)?)?.id().clone();
                let item = self.safe_name("item");
                self.rust_block(&format!("for {item} in {outer_field}"), |w| {
                    block(w, &item, &element)
                })
            }
            ShapeKind::Map { value, .. } => {
                let element = model.member_target(model.expect_shape(value)?)?.id().clone();
                let key = self.safe_name("key");
                let item = self.safe_name("value");
                self.rust_block(&format!("for ({key}, {item}) in {outer_field}"), |w| {
                    block(w, &item, &element)
                })
            }
            _ => Err(CodegenError::UnexpectedShapeKind {
                id: target.id().clone(),
                expected: "list or map",
            }),
        }
    }

    // ── Modules ──

    /// Write an inline `mod name { .. }` using a child writer for its contents.
    pub fn with_inline_module(
        &mut self,
        module: &RustModule,
        f: impl FnOnce(&mut RustWriter) -> Result<()>,
    ) -> Result<()> {
        let mut inner = self.child(format!("{}::{}", self.namespace, module.name()));
        f(&mut inner)?;
        self.embed_module(module, &inner)
    }

    pub(crate) fn embed_module(&mut self, module: &RustModule, inner: &RustWriter) -> Result<()> {
        self.ensure_newline();
        if let Some(docs) = module.documentation() {
            self.docs(docs);
        }
        let contents = join_sections(vec![inner.render_preamble(), inner.render_contents()]);
        self.open_block(&format!(
            "{}mod {} {{",
            module.visibility().prefix(),
            module.name()
        ));
        if !contents.is_empty() {
            self.emit(&contents);
        }
        self.close_block("}");
        self.dependencies
            .extend(inner.dependencies.iter().cloned());
        Ok(())
    }

    // ── Output ──

    fn render_preamble(&self) -> String {
        self.preamble.join("\n")
    }

    /// Imports, module declarations and body.
    fn render_contents(&self) -> String {
        let mut sections = Vec::new();
        if !self.use_declarations.is_empty() {
            sections.push(
                self.use_declarations
                    .iter()
                    .map(|path| format!("use {path};"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        if !self.module_declarations.is_empty() {
            sections.push(
                self.module_declarations
                    .values()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        sections.push(self.body.trim_end().to_string());
        join_sections(sections)
    }

    /// The final file text: preamble, banner, imports, module declarations, body.
    pub fn render(&self) -> Result<String> {
        let banner = if self.print_banner { BANNER } else { "" };
        let mut out = join_sections(vec![
            self.render_preamble(),
            banner.to_string(),
            self.render_contents(),
        ]);
        out.push('\n');
        Ok(out)
    }
}

fn join_sections(sections: Vec<String>) -> String {
    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Leading whitespace of the last (unfinished) line of `text`.
fn line_indent(text: &str) -> &str {
    let line = text.rsplit('\n').next().unwrap_or_default();
    &line[..line.len() - line.trim_start().len()]
}

/// Indent every line after the first by `indent`, leaving blank lines empty.
fn indent_continuation(text: &str, indent: &str) -> String {
    if indent.is_empty() || !text.contains('\n') {
        return text.to_string();
    }
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn block_open(header: &str) -> String {
    if header.is_empty() {
        "{".to_string()
    } else {
        format!("{header} {{")
    }
}

#[cfg(test)]
mod tests;
