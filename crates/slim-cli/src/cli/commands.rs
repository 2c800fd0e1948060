use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Optimize an application for production
    ///
    /// Probes the application, picks the fastest router its route table
    /// allows, removes framework APIs it never uses and writes a single
    /// bundled file.
    Optimize(OptimizeArgs),

    /// Print the routes an application registers
    ///
    /// With --watch, reloads and prints again after every change.
    Routes(RoutesArgs),
}

/// Arguments for the optimize command
#[derive(Args, Debug, Default)]
pub struct OptimizeArgs {
    /// Application entry file
    ///
    /// Defaults to the first of src/index.ts, src/index.tsx, src/index.js,
    /// src/index.jsx, index.ts, index.tsx, index.js, index.jsx that exists.
    #[arg(value_name = "ENTRY")]
    pub entry: Option<PathBuf>,

    /// Output file [default: dist/index.js]
    #[arg(short = 'o', long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Minify the output
    #[arg(short = 'm', long)]
    pub minify: bool,

    /// Environment target [default: node20]
    ///
    /// One of esnext, es2015..es2024, node18, node20, node22, node24, deno,
    /// bun, workerd, browser.
    #[arg(short = 't', long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Keep the framework's runtime router selection
    #[arg(long)]
    pub no_router_optimization: bool,

    /// Keep request body APIs even if no route accepts a body
    #[arg(long)]
    pub no_request_body_optimization: bool,

    /// Keep unused response APIs
    #[arg(long)]
    pub no_response_optimization: bool,

    /// Keep unused application lifecycle methods
    #[arg(long)]
    pub no_lifecycle_optimization: bool,

    /// Module specifiers to leave unbundled (repeatable)
    #[arg(long = "external", value_name = "SPEC")]
    pub external: Vec<String>,

    /// Path to a config file [default: slim.config.json]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the routes command
#[derive(Args, Debug, Default)]
pub struct RoutesArgs {
    /// Application entry file
    #[arg(value_name = "ENTRY")]
    pub entry: Option<PathBuf>,

    /// Print again whenever a source file changes
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Module specifiers to leave unbundled (repeatable)
    #[arg(long = "external", value_name = "SPEC")]
    pub external: Vec<String>,

    /// Path to a config file [default: slim.config.json]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
