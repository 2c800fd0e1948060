//! `slim routes`: print the routes an application registers.
//!
//! With `--watch`, every successful rebuild prints the table again; a failed
//! rebuild is reported and the session keeps waiting for the next change.

use crate::cli::RoutesArgs;
use crate::commands::utils;
use crate::config::CliOverrides;
use crate::error::{BuildError, Result};
use crate::ui;
use slim_loader::{AppStream, load};
use slim_optimize::extract_routes;

/// Execute the routes command.
pub async fn execute(args: RoutesArgs) -> Result<()> {
    let config = utils::load_config(&CliOverrides::from(&args), args.config.as_deref())?;
    let options = config.load_options().watch(args.watch);

    let mut apps = load(&config.entry, options);

    if !args.watch {
        let app = match apps.next().await {
            Some(app) => app.map_err(BuildError::from)?,
            None => return Ok(()),
        };
        ui::print_routes(&extract_routes(&app));
        return Ok(());
    }

    ui::info("Watching for changes (Ctrl+C to stop)");
    watch(&mut apps).await;
    Ok(())
}

async fn watch(apps: &mut AppStream) {
    loop {
        tokio::select! {
            item = apps.next() => match item {
                Some(Ok(app)) => {
                    let routes = extract_routes(&app);
                    ui::success(&format!("{} routes", routes.len()));
                    ui::print_routes(&routes);
                }
                Some(Err(err)) => ui::error(&err.to_string()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, closing watch session");
                apps.close();
                break;
            }
        }
    }
}
