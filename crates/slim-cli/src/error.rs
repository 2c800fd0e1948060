//! Error types for the Slim CLI.
//!
//! [`CliError`] is what every command returns. Domain errors convert into it
//! through `#[from]`:
//!
//! - [`UserInputError`] covers a bad entry, target or outfile. It is raised
//!   before any build work starts.
//! - [`ConfigError`] covers config files and layered values that fail to
//!   load or deserialize.
//! - [`BuildError`] covers failures from the loader or the optimizer.
//!
//! ```rust,no_run
//! use slim_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_manifest(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Run slim from the project root")
//! }
//! ```

mod diagnostic;

pub use diagnostic::cli_error_to_miette;

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration loading or deserialization failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The probe or production build failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A user-supplied value was rejected before any build work
    #[error(transparent)]
    UserInput(#[from] UserInputError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Invalid input from the command line or config file.
///
/// Every variant names the offending value.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum UserInputError {
    /// The given entry file does not exist
    #[error("Entry file not found: {}", .0.display())]
    #[diagnostic(
        code(slim::cli::entry_not_found),
        help("Pass an existing file, or omit the entry to use src/index.ts")
    )]
    EntryNotFound(PathBuf),

    /// No entry was given and none of the default candidates exist
    #[error("No entry file found in {}; tried {}", dir.display(), candidates.join(", "))]
    #[diagnostic(
        code(slim::cli::no_entry),
        help("Pass the entry file explicitly: slim optimize <ENTRY>")
    )]
    NoEntryCandidate {
        /// Directory the candidates were looked up in
        dir: PathBuf,
        /// Candidate paths, in lookup order
        candidates: Vec<String>,
    },

    /// The target is not in the whitelist
    #[error("Invalid target '{value}'")]
    #[diagnostic(code(slim::cli::invalid_target), help("Valid targets: {valid}"))]
    InvalidTarget {
        /// The rejected target id
        value: String,
        /// Comma-separated whitelist
        valid: String,
    },

    /// The output path names an existing directory
    #[error("Output path is a directory: {}", .0.display())]
    #[diagnostic(
        code(slim::cli::outfile_is_directory),
        help("Pass a file path such as dist/index.js to --outfile")
    )]
    OutfileIsDirectory(PathBuf),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file doesn't exist
    #[error("Config file not found: {}\n\nHint: Create slim.config.json or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// A layered value has the wrong shape or type
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// I/O error while reading config
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from the loader or the optimize pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The optimize pipeline failed
    #[error(transparent)]
    Optimize(#[from] slim_optimize::Error),

    /// Loading the application failed
    #[error(transparent)]
    Load(#[from] slim_loader::Error),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
