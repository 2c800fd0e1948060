//! Slim CLI - build-time optimizer for Hono applications.
//!
//! This crate is the `slim` binary's library half: argument definitions,
//! layered configuration, logging and terminal output around the
//! `slim-optimize` pipeline.
//!
//! - [`cli`] - clap argument definitions
//! - [`config`] - defaults, `slim.config.json`, `SLIM_` environment and CLI layering
//! - [`error`] - CLI error types and miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines, spinner and summaries
//! - `commands` - `optimize` and `routes`

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt, UserInputError};
