//! Summary of one optimize run.

use std::fmt;

use crate::emit::BuildArtifact;
use crate::router::RouterChoice;
use crate::specialize::RemovedMembers;

/// What an optimize run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationReport {
    /// Installed router, or `None` when router wiring was turned off.
    pub router: Option<RouterChoice>,
    /// Removed members, in fixed category order.
    pub removed: Vec<RemovedMembers>,
    pub artifact: BuildArtifact,
}

impl OptimizationReport {
    pub fn router_name(&self) -> &'static str {
        self.router
            .as_ref()
            .map_or("framework default", RouterChoice::router_name)
    }
}

impl fmt::Display for OptimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Router: {}", self.router_name())?;
        if self.removed.is_empty() {
            writeln!(f, "Removed: nothing")?;
        } else {
            writeln!(f, "Removed:")?;
            for removed in &self.removed {
                writeln!(
                    f,
                    "  {}: {}",
                    removed.category.label(),
                    removed.members.join(", ")
                )?;
            }
        }
        write!(
            f,
            "Output: {} ({})",
            self.artifact.path.display(),
            format_size(self.artifact.size)
        )
    }
}

/// Format a byte count with binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialize::Category;
    use std::path::PathBuf;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
    }

    #[test]
    fn test_report_display() {
        let report = OptimizationReport {
            router: Some(RouterChoice::RegExpBased),
            removed: vec![
                RemovedMembers {
                    category: Category::RequestBody,
                    members: vec!["parseBody".to_string(), "formData".to_string()],
                },
                RemovedMembers {
                    category: Category::Lifecycle,
                    members: vec!["mount".to_string()],
                },
            ],
            artifact: BuildArtifact {
                path: PathBuf::from("dist/index.js"),
                size: 3072,
            },
        };

        insta::assert_snapshot!(report.to_string(), @r"
        Router: RegExpRouter
        Removed:
          Request body APIs: parseBody, formData
          Lifecycle methods: mount
        Output: dist/index.js (3.00 KB)
        ");
    }

    #[test]
    fn test_report_without_router_wiring() {
        let report = OptimizationReport {
            router: None,
            removed: Vec::new(),
            artifact: BuildArtifact {
                path: PathBuf::from("out.js"),
                size: 10,
            },
        };
        assert_eq!(
            report.to_string(),
            "Router: framework default\nRemoved: nothing\nOutput: out.js (10 B)"
        );
    }
}
