//! Slim CLI - build-time optimizer for Hono applications.
//!
//! Parses arguments, sets up logging and dispatches to the command.

use clap::Parser;
use miette::Result;
use slim_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Optimize(optimize_args) => commands::optimize_execute(optimize_args).await,
        cli::Command::Routes(routes_args) => commands::routes_execute(routes_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
