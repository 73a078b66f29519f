use crate::config::CodegenSettings;
use crate::error::{CodegenError, Result};
use crate::symbol::{CargoDependency, InlineDependency};
use crate::writer::{RustModule, RustWriter};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// The generated crate: one writer per file, plus buffered inline modules.
///
/// Inline modules are accumulated in their own writers and embedded into their
/// parent's file by [`RustCrate::finalize`], so every inline module is emitted once no
/// matter how many times it is written to.
#[derive(Default)]
pub struct RustCrate {
    print_banner: bool,
    debug_mode: bool,
    files: BTreeMap<String, RustWriter>,
    inline_modules: BTreeMap<String, (RustModule, RustWriter)>,
    rendered_inline: BTreeSet<String>,
    finalized: bool,
}

impl RustCrate {
    pub fn new(settings: &CodegenSettings) -> Self {
        Self {
            print_banner: settings.codegen.include_banner,
            debug_mode: settings.codegen.debug_mode,
            ..Self::default()
        }
    }

    /// Write into `src/lib.rs`.
    pub fn lib(&mut self, f: impl FnOnce(&mut RustWriter) -> Result<()>) -> Result<()> {
        self.with_module(&RustModule::root(), f)
    }

    /// Write into `module`, creating its file (and declaring it in its parent) on
    /// first use.
    pub fn with_module(
        &mut self,
        module: &RustModule,
        f: impl FnOnce(&mut RustWriter) -> Result<()>,
    ) -> Result<()> {
        if !module.is_inline() {
            return f(self.file_writer(module));
        }

        // The owning file must exist even if nothing else is written to it.
        let owner = module.file_owner().clone();
        self.file_writer(&owner);

        let path = module.full_path();
        if !self.inline_modules.contains_key(&path) {
            let writer = self.inline_writer(module)?;
            self.inline_modules
                .insert(path.clone(), (module.clone(), writer));
        }
        match self.inline_modules.get_mut(&path) {
            Some((_, writer)) => f(writer),
            None => Err(CodegenError::UnknownFile(path)),
        }
    }

    fn inline_writer(&self, module: &RustModule) -> Result<RustWriter> {
        Ok(RustWriter::new(module.file_path(), module.full_path())?
            .with_banner(false)
            .with_debug_mode(self.debug_mode))
    }

    fn file_writer(&mut self, module: &RustModule) -> &mut RustWriter {
        let path = module.file_path();
        if !self.files.contains_key(&path) {
            if let Some(parent) = module.parent() {
                let parent = parent.file_owner().clone();
                self.file_writer(&parent).declare_module(module);
            }
            debug!(file = %path, module = %module, "creating module file");
        }
        let (print_banner, debug_mode) = (self.print_banner, self.debug_mode);
        self.files.entry(path).or_insert_with(|| {
            RustWriter::for_module(module)
                .with_banner(print_banner)
                .with_debug_mode(debug_mode)
        })
    }

    /// Render every referenced inline dependency (to a fixed point, in key order) and
    /// embed inline modules into their parents. Idempotent.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }

        loop {
            let pending: BTreeMap<String, InlineDependency> = self
                .files
                .values()
                .chain(self.inline_modules.values().map(|(_, w)| w))
                .flat_map(RustWriter::inline_dependencies)
                .filter(|dep| !self.rendered_inline.contains(dep.key()))
                .map(|dep| (dep.key().to_string(), dep.clone()))
                .collect();
            if pending.is_empty() {
                break;
            }
            for (key, dep) in pending {
                debug!(key = %key, module = %dep.module(), "rendering inline dependency");
                self.rendered_inline.insert(key);
                self.with_module(dep.module(), |w| dep.writable().write_to(w))?;
            }
        }

        self.embed_inline_modules()?;
        self.finalized = true;
        Ok(())
    }

    fn embed_inline_modules(&mut self) -> Result<()> {
        let depth = |path: &String| path.matches("::").count();
        let mut pending = std::mem::take(&mut self.inline_modules);

        // Deepest first, so children are inside a module before it is embedded.
        while let Some(path) = pending
            .keys()
            .max_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| b.cmp(a)))
            .cloned()
        {
            let Some((module, writer)) = pending.remove(&path) else {
                break;
            };
            match module.parent() {
                Some(parent) if parent.is_inline() => {
                    let parent_path = parent.full_path();
                    if !pending.contains_key(&parent_path) {
                        let parent_writer = self.inline_writer(parent)?;
                        pending.insert(parent_path.clone(), (parent.clone(), parent_writer));
                    }
                    if let Some((_, parent_writer)) = pending.get_mut(&parent_path) {
                        parent_writer.embed_module(&module, &writer)?;
                    }
                }
                _ => {
                    let owner = module.file_owner().clone();
                    self.file_writer(&owner).embed_module(&module, &writer)?;
                }
            }
        }
        Ok(())
    }

    /// Paths of every generated file.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Render one file, e.g. `src/lib.rs`.
    pub fn render(&self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .ok_or_else(|| CodegenError::UnknownFile(path.to_string()))?
            .render()
    }

    /// Render every file, keyed by path.
    pub fn render_all(&self) -> Result<BTreeMap<String, String>> {
        self.files
            .iter()
            .map(|(path, writer)| Ok((path.clone(), writer.render()?)))
            .collect()
    }

    /// Every Cargo dependency referenced anywhere in the crate.
    pub fn dependencies(&self) -> BTreeSet<CargoDependency> {
        self.files
            .values()
            .chain(self.inline_modules.values().map(|(_, w)| w))
            .flat_map(RustWriter::cargo_dependencies)
            .cloned()
            .collect()
    }

    /// Write every file under `dir`, creating directories as needed.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        for (path, contents) in self.render_all()? {
            let target = dir.join(&path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, contents)?;
            info!(file = %target.display(), "wrote generated module");
        }
        Ok(())
    }
}
