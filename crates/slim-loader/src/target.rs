//! Runtime environments and the module resolution conditions they imply.

use rolldown::Platform;

/// Environment where the compiled application will execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeEnvironment {
    /// Node.js (full APIs)
    #[default]
    Node,
    /// V8 isolate (Cloudflare Workers, Deno Deploy)
    EdgeWorker,
    /// Browser
    Browser,
    /// Runtime-agnostic ECMAScript output
    Neutral,
}

/// Export conditions for module resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportConditions {
    /// `["node", "import", "module", "default"]`
    Node,
    /// `["edge-light", "workerd", "worker", "browser", "import", "default"]`
    Edge,
    /// `["browser", "import", "module", "default"]`
    Browser,
    /// `["import", "module", "default"]`
    Neutral,
}

impl RuntimeEnvironment {
    pub fn conditions(self) -> ExportConditions {
        match self {
            Self::Node => ExportConditions::Node,
            Self::EdgeWorker => ExportConditions::Edge,
            Self::Browser => ExportConditions::Browser,
            Self::Neutral => ExportConditions::Neutral,
        }
    }

    /// Rolldown platform used when building for this environment.
    pub fn platform(self) -> Platform {
        match self {
            Self::Node => Platform::Node,
            Self::Browser | Self::EdgeWorker => Platform::Browser,
            Self::Neutral => Platform::Neutral,
        }
    }
}

impl ExportConditions {
    /// Condition names in priority order (more specific first).
    pub fn as_slice(&self) -> &'static [&'static str] {
        match self {
            Self::Node => &["node", "import", "module", "default"],
            Self::Edge => &[
                "edge-light",
                "workerd",
                "worker",
                "browser",
                "import",
                "default",
            ],
            Self::Browser => &["browser", "import", "module", "default"],
            Self::Neutral => &["import", "module", "default"],
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.as_slice().iter().map(|s| (*s).to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.as_slice().contains(&name)
    }

    /// `package.json` main fields consulted when no export condition matches.
    pub fn main_fields(&self) -> Vec<String> {
        let fields: &[&str] = if self.contains("browser") {
            &["browser", "module", "main"]
        } else {
            &["module", "main"]
        };
        fields.iter().map(|s| (*s).to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_conditions_prefer_specific_runtimes() {
        let conditions = RuntimeEnvironment::EdgeWorker.conditions();
        assert_eq!(conditions.as_slice()[0], "edge-light");
        assert!(conditions.contains("workerd"));
        assert!(!conditions.contains("node"));
    }

    #[test]
    fn test_main_fields_follow_browser_condition() {
        assert_eq!(ExportConditions::Node.main_fields(), vec!["module", "main"]);
        assert_eq!(
            ExportConditions::Browser.main_fields(),
            vec!["browser", "module", "main"]
        );
    }

    #[test]
    fn test_default_environment_is_node() {
        assert!(matches!(
            RuntimeEnvironment::default().platform(),
            Platform::Node
        ));
    }
}
