//! # slim-loader
//!
//! Build-and-execute module loader for request-routing applications.
//!
//! The loader compiles one entry file's transitive graph with Rolldown into an
//! in-memory bundle, evaluates it in an isolated Node.js process and hands back
//! a snapshot of the exported application. It backs the optimizer as well as
//! the sibling tools (request issuing, serving) through a single sequence
//! interface: one-shot loads yield exactly one [`ApplicationHandle`], watch mode
//! yields a fresh handle per successful rebuild.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slim_loader::{LoadOptions, load};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut apps = load("./src/index.ts", LoadOptions::new().external(["@hono/node-server"]));
//! if let Some(app) = apps.next().await {
//!     for route in app?.routes() {
//!         println!("{} {}", route.method, route.path);
//!     }
//! }
//! # Ok(()) }
//! ```

pub mod app;
pub mod compile;
pub mod diagnostics;
pub mod execute;
pub mod options;
pub mod plugins;
pub mod stream;
pub mod target;
pub mod watch;

pub use app::{ApplicationHandle, RawRoute, SourceClosure};
pub use compile::{BuildMode, CompiledBundle, compile};
pub use diagnostics::{BuildDiagnostic, DiagnosticKind};
pub use execute::{ExecutionReport, Executor, NodeExecutor};
pub use options::{DEFAULT_JSX_IMPORT_SOURCE, LoadOptions};
pub use plugins::{IntoPlugin, PluginPhase, PluginRegistry, SourceClosurePlugin, plugin};
pub use stream::{AppStream, build_application, load, load_with};
pub use target::{ExportConditions, RuntimeEnvironment};

// Re-export the plugin surface so callers can inject resolve/load hooks
pub use rolldown_common::{ModuleType, ResolvedExternal};
pub use rolldown_plugin::{
    __inner::SharedPluginable, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs,
    HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};

use std::path::PathBuf;

/// Error types for loader operations.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    /// Rolldown rejected the entry graph.
    #[error("Build failed: {}", format_diagnostics(.0))]
    #[diagnostic(code(slim::loader::bundler))]
    Bundler(Vec<BuildDiagnostic>),

    /// Entry file does not exist.
    #[error("Entry file not found: {}", .0.display())]
    #[diagnostic(
        code(slim::loader::entry_not_found),
        help("Pass an existing file or run from the project root")
    )]
    EntryNotFound(PathBuf),

    /// The bundle ran but its default export is not an application.
    #[error("Entry does not export an application: {0}")]
    #[diagnostic(
        code(slim::loader::invalid_application),
        help("The entry's default export must be the application object (`export default app`)")
    )]
    InvalidApplication(String),

    /// The bundle threw while being evaluated, or the runtime could not start.
    #[error("Failed to execute bundle: {0}")]
    #[diagnostic(code(slim::loader::execution))]
    Execution(String),

    /// The execution harness produced an unreadable report.
    #[error("Malformed execution report: {0}")]
    #[diagnostic(code(slim::loader::report))]
    Report(#[from] serde_json::Error),

    /// File watcher failure.
    #[error("File watcher error: {0}")]
    #[diagnostic(code(slim::loader::watch))]
    Watch(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(slim::loader::io))]
    Io(#[from] std::io::Error),
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error batch.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(diagnostics::extract_from_rolldown_error(error))
    }
}

fn format_diagnostics(diagnostics: &[BuildDiagnostic]) -> String {
    match diagnostics {
        [] => "unknown bundler error".to_string(),
        [single] => single.to_string(),
        many => format!(
            "{} errors: {}",
            many.len(),
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}
