//! Snapshot of an executed application.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One `(method, path)` pair as the application registered it.
///
/// `method` is whatever string the framework recorded (`GET`, `ALL`, custom
/// verbs); typed interpretation belongs to the route introspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRoute {
    pub method: String,
    pub path: String,
}

/// Source text of every module that went into a build, keyed by resolved id.
///
/// Ordered by id so that anything derived from it is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceClosure {
    modules: BTreeMap<String, String>,
}

impl SourceClosure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, code: impl Into<String>) {
        self.modules.insert(id.into(), code.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.modules.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.modules.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<(String, String)> for SourceClosure {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SourceClosure {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

/// The executed application, as observed from outside its runtime.
///
/// Holds the registered routes in registration order, the optional
/// behavioral probe record, and the compiled bundle so sibling tools can run
/// the same code again without rebuilding.
#[derive(Debug, Clone)]
pub struct ApplicationHandle {
    entry: PathBuf,
    routes: Vec<RawRoute>,
    unused_methods: Option<Vec<String>>,
    code: Arc<str>,
    closure: Arc<SourceClosure>,
}

impl ApplicationHandle {
    pub fn new(
        entry: impl Into<PathBuf>,
        routes: Vec<RawRoute>,
        unused_methods: Option<Vec<String>>,
        code: Arc<str>,
        closure: Arc<SourceClosure>,
    ) -> Self {
        Self {
            entry: entry.into(),
            routes,
            unused_methods,
            code,
            closure,
        }
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[RawRoute] {
        &self.routes
    }

    /// Lifecycle methods never touched during execution, when the build was
    /// instrumented to record them. `None` means no record was taken.
    pub fn unused_methods(&self) -> Option<&[String]> {
        self.unused_methods.as_deref()
    }

    pub fn code(&self) -> &Arc<str> {
        &self.code
    }

    pub fn closure(&self) -> &SourceClosure {
        &self.closure
    }
}
