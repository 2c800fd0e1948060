//! Error types for the optimizer.

use std::path::PathBuf;

/// Error types for optimize operations.
///
/// Router fallbacks and skipped specializations are not errors; they are
/// reported through [`crate::OptimizationReport`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    /// Probe or production build failed, or the entry is not an application.
    #[error("{0}")]
    #[diagnostic(code(slim::optimize::loader))]
    Loader(#[from] slim_loader::Error),

    /// The framework package is not installed.
    #[error("Framework package `hono` not found from {}", .0.display())]
    #[diagnostic(
        code(slim::optimize::framework_not_found),
        help("Install it with `npm install hono` in the project directory")
    )]
    FrameworkNotFound(PathBuf),

    /// The framework's package.json could not be read.
    #[error("Invalid framework manifest {}: {message}", path.display())]
    #[diagnostic(code(slim::optimize::framework_manifest))]
    FrameworkManifest { path: PathBuf, message: String },

    /// Two virtual modules claim the same import, or one claims itself.
    #[error("Conflicting virtual module filter: {0}")]
    #[diagnostic(code(slim::optimize::filter_conflict))]
    FilterConflict(String),

    /// The probe build ended without yielding an application.
    #[error("Probe build produced no application")]
    #[diagnostic(code(slim::optimize::no_application))]
    NoApplication,

    /// The artifact could not be written.
    #[error("Failed to write {}: {message}", path.display())]
    #[diagnostic(code(slim::optimize::write_failure))]
    WriteFailure { path: PathBuf, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(slim::optimize::io))]
    Io(#[from] std::io::Error),
}

/// Result type alias for optimize operations.
pub type Result<T> = std::result::Result<T, Error>;
