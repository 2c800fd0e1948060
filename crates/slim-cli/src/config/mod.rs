//! Layered configuration for the Slim CLI.
//!
//! Sources, lowest priority first: defaults, `slim.config.json` (or the file
//! passed with `--config`), `SLIM_` environment variables, then CLI flags.
//! Nested keys use a double underscore in the environment, as in
//! `SLIM_OPTIMIZATIONS__LIFECYCLE=false`.

mod loading;
mod target;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use loading::{CONFIG_FILE, CliOverrides, OptimizationOverrides};
pub use target::Target;
pub use validation::{ENTRY_CANDIDATES, ValidatedConfig};

pub const DEFAULT_TARGET: &str = "node20";

/// Slim configuration, as loaded from every source.
///
/// `target` stays a string here so an unknown id surfaces from
/// [`SlimConfig::validate`] with the offending value, not as a
/// deserialization error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimConfig {
    /// Application entry file; a default candidate is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,

    /// Output file
    #[serde(default = "default_outfile")]
    pub outfile: PathBuf,

    /// Minify the output
    #[serde(default)]
    pub minify: bool,

    /// Environment target id
    #[serde(default = "default_target")]
    pub target: String,

    /// Specifiers left unbundled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external: Vec<String>,

    /// Per-category specialization switches
    #[serde(default)]
    pub optimizations: Optimizations,

    /// Project root; relative paths resolve against it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

/// Per-category specialization switches, all on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimizations {
    #[serde(default = "enabled")]
    pub router: bool,

    #[serde(default = "enabled", alias = "request_body")]
    pub request_body: bool,

    #[serde(default = "enabled")]
    pub response: bool,

    #[serde(default = "enabled")]
    pub lifecycle: bool,
}

impl Default for Optimizations {
    fn default() -> Self {
        Self {
            router: true,
            request_body: true,
            response: true,
            lifecycle: true,
        }
    }
}

impl From<Optimizations> for slim_optimize::SpecializationToggles {
    fn from(value: Optimizations) -> Self {
        Self {
            router: value.router,
            request_body: value.request_body,
            response: value.response,
            lifecycle: value.lifecycle,
        }
    }
}

impl Default for SlimConfig {
    fn default() -> Self {
        Self {
            entry: None,
            outfile: default_outfile(),
            minify: false,
            target: default_target(),
            external: Vec::new(),
            optimizations: Optimizations::default(),
            cwd: None,
        }
    }
}

fn default_outfile() -> PathBuf {
    PathBuf::from(slim_optimize::emit::DEFAULT_OUTFILE)
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn enabled() -> bool {
    true
}
