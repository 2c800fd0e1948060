//! `slim optimize`: probe the application, specialize the framework for
//! it and write the production bundle.

use crate::cli::OptimizeArgs;
use crate::commands::utils;
use crate::config::CliOverrides;
use crate::error::{BuildError, Result};
use crate::ui;
use slim_optimize::Optimizer;
use std::time::Instant;

/// Execute the optimize command.
///
/// Configuration is validated before anything is built, so a bad target or
/// entry fails without touching the output file.
pub async fn execute(args: OptimizeArgs) -> Result<()> {
    let start = Instant::now();

    let config = utils::load_config(&CliOverrides::from(&args), args.config.as_deref())?;
    let options = config.optimize_options();

    let spinner = ui::Spinner::new(&format!(
        "Optimizing {} for {}...",
        config
            .entry
            .strip_prefix(&config.root)
            .unwrap_or(&config.entry)
            .display(),
        config.target
    ));

    let report = match Optimizer::node(&config.root).run(&options).await {
        Ok(report) => {
            spinner.finish("Optimized");
            report
        }
        Err(err) => {
            spinner.fail("Optimization failed");
            return Err(BuildError::from(err).into());
        }
    };

    ui::print_summary(&report, &config.root, start.elapsed());
    Ok(())
}
