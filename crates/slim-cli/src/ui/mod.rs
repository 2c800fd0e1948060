//! Terminal output: status lines, a spinner and run summaries.
//!
//! Everything goes to stderr so stdout stays free for piped route tables.
//!
//! ```no_run
//! use slim_cli::ui;
//!
//! ui::init_colors(false);
//! let spinner = ui::Spinner::new("Probing application...");
//! spinner.finish("Probe complete");
//! ui::success("Wrote dist/index.js");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, format_size, print_routes, print_summary};
pub use messages::{error, info, success, warning};
pub use spinner::Spinner;

use owo_colors::{OwoColorize, Style};

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise stderr must be a terminal.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    console::user_attended_stderr() && !is_ci()
}

/// Decide once whether stderr output is colored.
pub fn init_colors(no_color: bool) {
    console::set_colors_enabled_stderr(!no_color && should_use_color());
}

/// Apply `style` when colors are enabled.
pub(crate) fn paint(text: &str, style: Style) -> String {
    if console::colors_enabled_stderr() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}
