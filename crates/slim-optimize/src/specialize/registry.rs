//! Virtual module bookkeeping.
//!
//! A virtual module replaces one real framework file. It is reached either
//! through a bare specifier (`hono`) or through any relative import that
//! resolves to the replaced file. Its id is the real path plus a
//! `?slim=<name>` query, so relative imports inside it resolve against the
//! real file's directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;

use crate::{Error, Result};

/// Query marker carried by every virtual module id.
pub const VIRTUAL_QUERY: &str = "?slim=";

/// Which imports a virtual module answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFilter {
    /// Exact bare specifier, e.g. `hono`.
    pub bare: Option<String>,
    /// Real file whose relative imports are redirected.
    pub file: PathBuf,
}

impl ResolveFilter {
    pub fn file(file: impl Into<PathBuf>) -> Self {
        Self {
            bare: None,
            file: file.into(),
        }
    }

    pub fn with_bare(mut self, specifier: impl Into<String>) -> Self {
        self.bare = Some(specifier.into());
        self
    }

    /// Whether an import of `specifier` from `importer` is redirected.
    ///
    /// Entry points (no importer) and absolute specifiers never match; the
    /// latter is how a virtual module reaches the file it replaces.
    pub fn matches(&self, specifier: &str, importer: Option<&str>) -> bool {
        let Some(importer) = importer else {
            return false;
        };
        if self.bare.as_deref() == Some(specifier) {
            return true;
        }
        resolve_relative(specifier, importer).is_some_and(|target| target == self.file)
    }
}

/// `./x` or `../x`.
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Strip a `?query` suffix from a module id.
pub fn strip_query(id: &str) -> &str {
    id.split_once('?').map_or(id, |(path, _)| path)
}

/// Absolute, cleaned target of a relative `specifier` imported by `importer`.
pub fn resolve_relative(specifier: &str, importer: &str) -> Option<PathBuf> {
    if !is_relative(specifier) {
        return None;
    }
    let importer = Path::new(strip_query(importer));
    let dir = importer.parent()?;
    Some(dir.join(specifier).clean())
}

/// One registered replacement module.
#[derive(Debug, Clone)]
pub struct VirtualModule {
    pub id: String,
    pub filter: ResolveFilter,
    pub content: Arc<str>,
}

impl VirtualModule {
    /// Module named `name` standing in for `filter.file`.
    pub fn new(name: &str, filter: ResolveFilter, content: impl Into<Arc<str>>) -> Self {
        let id = format!("{}{VIRTUAL_QUERY}{name}", filter.file.display());
        Self {
            id,
            filter,
            content: content.into(),
        }
    }
}

/// Virtual modules for one build, in registration order.
#[derive(Debug, Clone, Default)]
pub struct VirtualModuleRegistry {
    modules: Vec<VirtualModule>,
}

impl VirtualModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `module`. Filters must be disjoint and a bare filter must be a
    /// package specifier. Self-imports are excluded in [`Self::resolve`].
    pub fn register(&mut self, module: VirtualModule) -> Result<()> {
        if !module.filter.file.is_absolute()
            || module
                .filter
                .file
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
        {
            return Err(Error::FilterConflict(format!(
                "filter file for `{}` must be an absolute, clean path",
                module.id
            )));
        }
        if let Some(bare) = module
            .filter
            .bare
            .as_deref()
            .filter(|bare| bare.is_empty() || is_relative(bare) || Path::new(bare).is_absolute())
        {
            return Err(Error::FilterConflict(format!(
                "`{bare}` is not a bare specifier (registering `{}`)",
                module.id
            )));
        }
        for existing in &self.modules {
            if existing.id == module.id {
                return Err(Error::FilterConflict(format!(
                    "`{}` is already registered",
                    module.id
                )));
            }
            if existing.filter.file == module.filter.file {
                return Err(Error::FilterConflict(format!(
                    "`{}` and `{}` both replace {}",
                    existing.id,
                    module.id,
                    module.filter.file.display()
                )));
            }
            if module.filter.bare.is_some() && existing.filter.bare == module.filter.bare {
                return Err(Error::FilterConflict(format!(
                    "`{}` and `{}` both claim `{}`",
                    existing.id,
                    module.id,
                    module.filter.bare.as_deref().unwrap_or_default()
                )));
            }
        }
        self.modules.push(module);
        Ok(())
    }

    /// Virtual module an import is redirected to. A module never captures
    /// its own imports.
    pub fn resolve(&self, specifier: &str, importer: Option<&str>) -> Option<&VirtualModule> {
        self.modules
            .iter()
            .filter(|module| importer != Some(module.id.as_str()))
            .find(|module| module.filter.matches(specifier, importer))
    }

    pub fn get(&self, id: &str) -> Option<&VirtualModule> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VirtualModule> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
