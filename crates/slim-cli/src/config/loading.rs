use crate::cli::{OptimizeArgs, RoutesArgs};
use crate::config::SlimConfig;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the project root.
pub const CONFIG_FILE: &str = "slim.config.json";

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outfile: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<Vec<String>>,
    #[serde(skip_serializing_if = "OptimizationOverrides::is_empty")]
    pub optimizations: OptimizationOverrides,
}

/// `--no-*-optimization` flags; only a given flag overrides.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<bool>,
}

impl OptimizationOverrides {
    fn is_empty(&self) -> bool {
        self.router.is_none()
            && self.request_body.is_none()
            && self.response.is_none()
            && self.lifecycle.is_none()
    }
}

/// `Some(false)` when a `--no-*` flag was passed.
fn disabled(flag: bool) -> Option<bool> {
    flag.then_some(false)
}

impl From<&OptimizeArgs> for CliOverrides {
    fn from(args: &OptimizeArgs) -> Self {
        Self {
            entry: args.entry.clone(),
            outfile: args.outfile.clone(),
            minify: args.minify.then_some(true),
            target: args.target.clone(),
            external: (!args.external.is_empty()).then(|| args.external.clone()),
            optimizations: OptimizationOverrides {
                router: disabled(args.no_router_optimization),
                request_body: disabled(args.no_request_body_optimization),
                response: disabled(args.no_response_optimization),
                lifecycle: disabled(args.no_lifecycle_optimization),
            },
        }
    }
}

impl From<&RoutesArgs> for CliOverrides {
    fn from(args: &RoutesArgs) -> Self {
        Self {
            entry: args.entry.clone(),
            external: (!args.external.is_empty()).then(|| args.external.clone()),
            ..Default::default()
        }
    }
}

impl SlimConfig {
    /// Load configuration from every source.
    ///
    /// `root` is where `slim.config.json` is looked up and where a relative
    /// `--config` path resolves. An explicit `--config` that does not exist
    /// is an error; a missing default file is not.
    pub fn load(overrides: &CliOverrides, config_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file(config_path, root)? {
            tracing::debug!("Loading config from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        // SLIM_TARGET, SLIM_OUTFILE, SLIM_OPTIMIZATIONS__LIFECYCLE, ...
        figment = figment.merge(Env::prefixed("SLIM_").split("__"));

        figment = figment.merge(Serialized::defaults(overrides));

        figment.extract().map_err(|e| {
            let field = if e.path.is_empty() {
                "configuration".to_string()
            } else {
                e.path.join(".")
            };
            ConfigError::InvalidValue {
                field,
                value: e.kind.to_string(),
                hint: format!("Check {CONFIG_FILE} and SLIM_* environment variables"),
            }
            .into()
        })
    }
}

fn config_file(explicit: Option<&Path>, root: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let path = root.join(path);
            if path.is_file() {
                Ok(Some(path))
            } else {
                Err(ConfigError::NotFound(path).into())
            }
        }
        None => {
            let path = root.join(CONFIG_FILE);
            Ok(path.is_file().then_some(path))
        }
    }
}
