use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use rolldown_plugin::__inner::SharedPluginable;

use crate::plugins::IntoPlugin;
use crate::target::RuntimeEnvironment;

/// Package the automatic JSX runtime is imported from.
pub const DEFAULT_JSX_IMPORT_SOURCE: &str = "hono/jsx";

/// Default quiet period before a burst of file events triggers a rebuild.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Options accepted by [`crate::load`] and [`crate::compile`].
///
/// Plugins run in the order they were added, after the loader's own
/// virtual-phase plugins and before the source closure collector.
#[derive(Clone)]
pub struct LoadOptions {
    /// Module specifiers left unresolved (e.g. a host-server adapter).
    pub external: Vec<String>,
    /// Keep watching the entry tree and yield one handle per rebuild.
    pub watch: bool,
    /// Emit an inline sourcemap into the compiled bundle.
    pub sourcemap: bool,
    /// Caller-supplied build hooks.
    pub plugins: Vec<SharedPluginable>,
    /// Working directory for resolution. Defaults to the entry's directory.
    pub cwd: Option<PathBuf>,
    pub runtime: RuntimeEnvironment,
    /// Syntax level to lower to (`es2018`, `node20`, ...). `None` keeps
    /// source syntax as written.
    pub target: Option<String>,
    pub jsx_import_source: String,
    pub debounce: Duration,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self {
            external: Vec::new(),
            watch: false,
            sourcemap: false,
            plugins: Vec::new(),
            cwd: None,
            runtime: RuntimeEnvironment::Node,
            target: None,
            jsx_import_source: DEFAULT_JSX_IMPORT_SOURCE.to_string(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn external<I, S>(mut self, specifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external.extend(specifiers.into_iter().map(Into::into));
        self
    }

    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }

    pub fn sourcemap(mut self, enabled: bool) -> Self {
        self.sourcemap = enabled;
        self
    }

    /// Append a build plugin.
    pub fn plugin(mut self, plugin: impl IntoPlugin) -> Self {
        self.plugins.push(plugin.into_plugin());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn runtime(mut self, runtime: RuntimeEnvironment) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn jsx_import_source(mut self, source: impl Into<String>) -> Self {
        self.jsx_import_source = source.into();
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("external", &self.external)
            .field("watch", &self.watch)
            .field("sourcemap", &self.sourcemap)
            .field("plugins", &self.plugins.len())
            .field("cwd", &self.cwd)
            .field("runtime", &self.runtime)
            .field("target", &self.target)
            .field("jsx_import_source", &self.jsx_import_source)
            .field("debounce", &self.debounce)
            .finish()
    }
}
