//! Which optional framework members the application actually uses.
//!
//! Two signals are combined. The textual scan looks for `.name(` anywhere in
//! the application's source closure, including inside strings and comments;
//! a hit always means "used". The behavioral probe instruments the framework
//! base class during the probe run and records which lifecycle methods were
//! never touched. Textual evidence wins over the probe.

use std::collections::BTreeSet;
use std::path::PathBuf;

use regex::Regex;
use slim_loader::SourceClosure;
use tracing::debug;

use crate::framework::{CONTEXT_FILE, HONO_BASE_FILE, REQUEST_FILE};
use crate::specialize::VIRTUAL_QUERY;

/// Name of the global the lifecycle probe records into.
pub const PROBE_RECORD_GLOBAL: &str = "__slimUnusedMethods";

/// A fixed set of removable members of one framework class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalogue {
    /// Exported class name.
    pub class_name: &'static str,
    /// File under the framework's `dist/` defining the class.
    pub file: &'static str,
    pub members: &'static [&'static str],
}

impl Catalogue {
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(&name)
    }
}

/// Response helpers on `Context`.
pub const RESPONSE: Catalogue = Catalogue {
    class_name: "Context",
    file: CONTEXT_FILE,
    members: &[
        "json",
        "html",
        "redirect",
        "body",
        "render",
        "setRenderer",
        "setLayout",
        "getLayout",
    ],
};

/// Body readers on `HonoRequest`.
pub const REQUEST_BODY: Catalogue = Catalogue {
    class_name: "HonoRequest",
    file: REQUEST_FILE,
    members: &[
        "parseBody",
        "json",
        "text",
        "arrayBuffer",
        "blob",
        "formData",
        "bodyCache",
        "#cachedBody",
    ],
};

/// Application-level lifecycle methods on the base class.
pub const LIFECYCLE: Catalogue = Catalogue {
    class_name: "HonoBase",
    file: HONO_BASE_FILE,
    members: &[
        "route", "basePath", "onError", "notFound", "mount", "fire", "request",
    ],
};

/// Member names confirmed referenced. Names are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedMemberSet {
    names: BTreeSet<String>,
}

impl UsedMemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` used. Returns `true` if it was not marked before.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Extend<String> for UsedMemberSet {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.names.extend(iter);
    }
}

/// Every catalogued name across the three surfaces, deduplicated.
///
/// The scan sees member names, not receivers, so a name shared by two
/// catalogues (`json` on both `Context` and `HonoRequest`) is kept on both as
/// soon as either is called. `c.json(` therefore keeps `HonoRequest.json`.
/// Over-keeping only costs bytes; telling receivers apart would need type
/// information the scan does not have.
pub fn catalogued_names() -> BTreeSet<&'static str> {
    [RESPONSE, REQUEST_BODY, LIFECYCLE]
        .iter()
        .flat_map(|c| c.members.iter().copied())
        .collect()
}

/// Scan every module of `closure` except `excluded` files and virtual
/// modules for `.name(` occurrences.
pub fn scan_closure<'a>(
    closure: &SourceClosure,
    names: impl IntoIterator<Item = &'a str>,
    excluded: &[PathBuf],
) -> UsedMemberSet {
    let mut used = UsedMemberSet::new();
    let alternatives: Vec<String> = names.into_iter().map(regex::escape).collect();
    if alternatives.is_empty() {
        return used;
    }
    let pattern = format!(r"\.({})\(", alternatives.join("|"));
    let Ok(call) = Regex::new(&pattern) else {
        return used;
    };

    for (id, code) in closure {
        if id.contains(VIRTUAL_QUERY) || excluded.iter().any(|path| path.as_os_str() == id.as_str()) {
            continue;
        }
        for caps in call.captures_iter(code) {
            if used.insert(caps[1].to_string()) {
                debug!(member = &caps[1], module = %id, "member referenced");
            }
        }
    }
    used
}

/// Combined usage verdict for one invocation.
#[derive(Debug, Clone, Default)]
pub struct UsageAnalysis {
    used: UsedMemberSet,
    behavioral_unused: Option<BTreeSet<String>>,
}

impl UsageAnalysis {
    pub fn new(used: UsedMemberSet, behavioral_unused: Option<&[String]>) -> Self {
        Self {
            used,
            behavioral_unused: behavioral_unused.map(|names| names.iter().cloned().collect()),
        }
    }

    pub fn used(&self) -> &UsedMemberSet {
        &self.used
    }

    /// Members of a textually scanned catalogue with no evidence of use.
    pub fn unused_in(&self, catalogue: &Catalogue) -> Vec<String> {
        catalogue
            .members
            .iter()
            .filter(|name| !self.used.contains(name))
            .map(|name| (*name).to_string())
            .collect()
    }

    /// Lifecycle methods the probe never saw touched and no source mentions.
    /// Without a probe record nothing counts as unused.
    pub fn unused_lifecycle(&self) -> Vec<String> {
        let Some(untouched) = &self.behavioral_unused else {
            return Vec::new();
        };
        LIFECYCLE
            .members
            .iter()
            .filter(|name| untouched.contains(**name) && !self.used.contains(name))
            .map(|name| (*name).to_string())
            .collect()
    }
}

/// Analyze a probe run: scan the closure and fold in the probe record.
pub fn analyze(
    closure: &SourceClosure,
    behavioral_unused: Option<&[String]>,
    excluded: &[PathBuf],
) -> UsageAnalysis {
    let used = scan_closure(closure, catalogued_names(), excluded);
    UsageAnalysis::new(used, behavioral_unused)
}

/// Stand-in for the framework base class used during the probe build.
///
/// Re-exports the real module (by absolute path, so the redirect never
/// applies to it) and shadows `HonoBase` with a subclass that wraps each
/// lifecycle member in a self-removing accessor. The first read or write of
/// a member removes it from the global record.
pub fn lifecycle_probe_module(base_file: &std::path::Path) -> String {
    let specifier = serde_json::Value::String(base_file.to_string_lossy().into_owned());
    let names = serde_json::Value::from(LIFECYCLE.members.to_vec());

    format!(
        r#"import {{ HonoBase as FrameworkBase }} from {specifier};
export * from {specifier};

const LIFECYCLE = {names};
const record = (globalThis.{PROBE_RECORD_GLOBAL} ??= new Set());
for (const name of LIFECYCLE) record.add(name);

class HonoBase extends FrameworkBase {{
  constructor(...args) {{
    super(...args);
    for (const name of LIFECYCLE) {{
      const original = this[name];
      Object.defineProperty(this, name, {{
        configurable: true,
        get() {{
          record.delete(name);
          Object.defineProperty(this, name, {{ value: original, writable: true, configurable: true }});
          return original;
        }},
        set(value) {{
          record.delete(name);
          Object.defineProperty(this, name, {{ value, writable: true, configurable: true }});
        }},
      }});
    }}
  }}
}}

export {{ HonoBase }};
"#
    )
}
