//! Spinner for steps without a known duration.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::Style;
use std::time::Duration;

use super::paint;

/// Spinner drawn on stderr; hidden when stderr is not a terminal.
///
/// ```no_run
/// use slim_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Building...");
/// spinner.finish("Built");
/// ```
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("valid template")
                .tick_strings(&["◐", "◓", "◑", "◒", ""]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Stop with a green check.
    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(format!(
            "{} {}",
            paint("✓", Style::new().green()),
            message
        ));
    }

    /// Stop with a red cross.
    pub fn fail(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", paint("✗", Style::new().red()), message));
    }

    /// Remove the spinner line without a final message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let spinner = Spinner::new("Loading...");
        spinner.set_message("Updated");
        spinner.finish("Done");
    }

    #[test]
    fn test_spinner_fail() {
        let spinner = Spinner::new("Processing");
        spinner.fail("Failed");
    }
}
