//! Command-line interface definition.
//!
//! # Command Structure
//!
//! - `slim optimize` - Specialize the framework for one application and build it
//! - `slim routes` - Print an application's route table, optionally on every change

mod commands;

use clap::Parser;

pub use commands::{Command, OptimizeArgs, RoutesArgs};

/// Slim - build-time optimizer for Hono applications
#[derive(Parser, Debug)]
#[command(
    name = "slim",
    version,
    about = "Build-time optimizer for Hono applications",
    long_about = "Slim runs your application once to learn its routes and the framework APIs it\n\
                  uses, then emits a single-file production build with a precomputed router and\n\
                  unused framework code removed."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
