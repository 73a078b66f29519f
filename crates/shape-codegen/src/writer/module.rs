use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    PubCrate,
    Private,
}

impl Visibility {
    /// Prefix to put in front of an item, including the trailing space.
    pub fn prefix(self) -> &'static str {
        match self {
            Visibility::Public => "pub ",
            Visibility::PubCrate => "pub(crate) ",
            Visibility::Private => "",
        }
    }
}

/// A Rust module in the generated crate.
///
/// Non-inline modules live in their own file (`src/a.rs`, `src/a/b.rs`); inline
/// modules are rendered as `mod name { .. }` inside their parent's file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RustModule {
    name: String,
    parent: Option<Box<RustModule>>,
    visibility: Visibility,
    inline: bool,
    documentation: Option<String>,
}

impl RustModule {
    /// The crate root, `src/lib.rs`.
    pub fn root() -> Self {
        Self {
            name: "crate".to_string(),
            parent: None,
            visibility: Visibility::Public,
            inline: false,
            documentation: None,
        }
    }

    pub fn public(name: impl Into<String>) -> Self {
        Self::new(name, Visibility::Public)
    }

    pub fn private(name: impl Into<String>) -> Self {
        Self::new(name, Visibility::Private)
    }

    pub fn pub_crate(name: impl Into<String>) -> Self {
        Self::new(name, Visibility::PubCrate)
    }

    fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            parent: Some(Box::new(Self::root())),
            visibility,
            inline: false,
            documentation: None,
        }
    }

    pub fn with_documentation(mut self, docs: impl Into<String>) -> Self {
        self.documentation = Some(docs.into());
        self
    }

    /// Nest this module under `parent`.
    pub fn child_of(mut self, parent: &RustModule) -> Self {
        self.parent = Some(Box::new(parent.clone()));
        self
    }

    /// Render this module inline in its parent's file.
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&RustModule> {
        self.parent.as_deref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    /// `crate::a::b`
    pub fn full_path(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}::{}", parent.full_path(), self.name),
            None => self.name.clone(),
        }
    }

    /// The module whose file this module's code ends up in.
    pub fn file_owner(&self) -> &RustModule {
        match &self.parent {
            Some(parent) if self.inline => parent.file_owner(),
            _ => self,
        }
    }

    /// Path of the file holding this module, relative to the crate root.
    pub fn file_path(&self) -> String {
        let owner = self.file_owner();
        if owner.is_root() {
            return "src/lib.rs".to_string();
        }
        let mut segments = Vec::new();
        let mut current = Some(owner);
        while let Some(module) = current {
            if !module.is_root() {
                segments.push(module.name.as_str());
            }
            current = module.parent();
        }
        segments.reverse();
        format!("src/{}.rs", segments.join("/"))
    }

    /// `pub mod name;`
    pub fn declaration(&self) -> String {
        format!("{}mod {};", self.visibility.prefix(), self.name)
    }
}

impl fmt::Display for RustModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let operation = RustModule::public("operation");
        let get_thing = RustModule::public("get_thing").child_of(&operation).inline();
        let nested = RustModule::private("inner").child_of(&get_thing).inline();

        assert_eq!(operation.full_path(), "crate::operation");
        assert_eq!(operation.file_path(), "src/operation.rs");
        assert_eq!(get_thing.full_path(), "crate::operation::get_thing");
        assert_eq!(get_thing.file_path(), "src/operation.rs");
        assert_eq!(nested.file_path(), "src/operation.rs");
        assert_eq!(RustModule::root().file_path(), "src/lib.rs");
    }

    #[test]
    fn test_nested_file_module() {
        let types = RustModule::public("types");
        let error = RustModule::public("error").child_of(&types);
        assert_eq!(error.file_path(), "src/types/error.rs");
        assert_eq!(error.declaration(), "pub mod error;");
        assert_eq!(RustModule::pub_crate("x").declaration(), "pub(crate) mod x;");
    }
}
