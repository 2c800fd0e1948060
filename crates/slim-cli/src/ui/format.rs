//! Formatting of durations, optimize summaries and route tables.

use console::Term;
use owo_colors::Style;
use slim_optimize::{OptimizationReport, RouteTable};
use std::path::Path;
use std::time::Duration;

use super::paint;

pub use slim_optimize::format_size;

/// Format a duration as `ms`, seconds, or minutes and seconds.
///
/// ```
/// use std::time::Duration;
/// use slim_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn rule() -> String {
    let width = Term::stderr().size().1 as usize;
    "─".repeat(width.clamp(20, 80))
}

/// Print what an optimize run did to stderr.
///
/// `root` shortens the output path when it lies inside the project.
pub fn print_summary(report: &OptimizationReport, root: &Path, elapsed: Duration) {
    let label = Style::new().bold();
    let dim = Style::new().dimmed();

    eprintln!("\n{}", paint("Optimization Summary", Style::new().bold().underline()));
    eprintln!("{}", rule());

    eprintln!(
        "  {}  {}",
        paint("Router ", label),
        paint(report.router_name(), Style::new().cyan())
    );

    if report.removed.is_empty() {
        eprintln!("  {}  {}", paint("Removed", label), paint("nothing", dim));
    } else {
        for (i, removed) in report.removed.iter().enumerate() {
            let heading = if i == 0 { "Removed" } else { "       " };
            eprintln!(
                "  {}  {}: {}",
                paint(heading, label),
                removed.category.label(),
                paint(&removed.members.join(", "), dim)
            );
        }
    }

    let path = report
        .artifact
        .path
        .strip_prefix(root)
        .unwrap_or(&report.artifact.path);
    eprintln!(
        "  {}  {} {}",
        paint("Output ", label),
        paint(&path.display().to_string(), Style::new().bright_white().bold()),
        paint(&format!("({})", format_size(report.artifact.size)), dim)
    );

    eprintln!("{}", rule());
    eprintln!(
        "  {} in {}",
        paint("Done", label),
        paint(&format_duration(elapsed), Style::new().green())
    );
}

/// Print a route table to stdout, one `METHOD path` per line.
pub fn print_routes(routes: &RouteTable) {
    let width = routes
        .iter()
        .map(|route| route.method.as_str().len())
        .max()
        .unwrap_or(0);

    for route in routes {
        let method = format!("{:<width$}", route.method.as_str());
        println!("{}  {}", paint(&method, Style::new().cyan().bold()), route.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_millis() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(59_990)), "59.99s");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_format_size_is_shared_with_report() {
        assert_eq!(format_size(1_048_576), "1.00 MB");
    }
}
