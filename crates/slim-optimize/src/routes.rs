//! Typed view of an application's registered routes.

use std::fmt;

use serde::{Deserialize, Serialize};
use slim_loader::{ApplicationHandle, RawRoute};

/// HTTP method of a registered route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
    /// Wildcard registration (`app.all`, `app.use`).
    All,
    /// Any other verb the framework accepted (`app.on("PURGE", ...)`).
    Custom(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::All => "ALL",
            Method::Custom(name) => name,
        }
    }

    /// Whether a request with this method never carries a body.
    ///
    /// `ALL` matches POST as well, and unknown verbs may carry anything.
    pub fn is_bodyless(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options)
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "ALL" => Method::All,
            other => Method::Custom(other.to_string()),
        }
    }
}

impl From<String> for Method {
    fn from(value: String) -> Self {
        Method::from(value.as_str())
    }
}

impl From<Method> for String {
    fn from(value: Method) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered `(method, path)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
}

impl RouteEntry {
    pub fn new(method: impl Into<Method>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

impl From<&RawRoute> for RouteEntry {
    fn from(raw: &RawRoute) -> Self {
        RouteEntry::new(raw.method.as_str(), raw.path.clone())
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Routes in registration order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct paths, first registration wins.
    pub fn distinct_paths(&self) -> Vec<&str> {
        let mut seen = indexmap::IndexSet::new();
        for entry in &self.entries {
            seen.insert(entry.path.as_str());
        }
        seen.into_iter().collect()
    }
}

impl FromIterator<RouteEntry> for RouteTable {
    fn from_iter<T: IntoIterator<Item = RouteEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Read the application's route table, preserving registration order.
pub fn extract_routes(app: &ApplicationHandle) -> RouteTable {
    app.routes().iter().map(RouteEntry::from).collect()
}

/// True if any route can receive a request body.
pub fn requires_request_body(routes: &RouteTable) -> bool {
    routes.iter().any(|route| !route.method.is_bodyless())
}
