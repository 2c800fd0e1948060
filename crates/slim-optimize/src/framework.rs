//! Location of the installed framework package.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

/// npm package name of the framework.
pub const PACKAGE_NAME: &str = "hono";

/// Core files the specializer rewrites or replaces, relative to `dist/`.
pub const HONO_BASE_FILE: &str = "hono-base.js";
pub const CONTEXT_FILE: &str = "context.js";
pub const REQUEST_FILE: &str = "request.js";
pub const HONO_FILE: &str = "hono.js";
pub const INDEX_FILE: &str = "index.js";

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

/// Installed framework package: root directory (symlinks resolved) and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkLayout {
    root: PathBuf,
    version: Option<String>,
}

impl FrameworkLayout {
    /// Walk up from `start` until a `node_modules/hono` package is found.
    pub async fn locate(start: &Path) -> Result<Self> {
        for dir in start.ancestors() {
            let candidate = dir.join("node_modules").join(PACKAGE_NAME);
            if tokio::fs::try_exists(candidate.join("package.json"))
                .await
                .unwrap_or(false)
            {
                return Self::from_root(&candidate).await;
            }
        }
        Err(Error::FrameworkNotFound(start.to_path_buf()))
    }

    /// Read the package at `root`.
    pub async fn from_root(root: &Path) -> Result<Self> {
        let manifest_path = root.join("package.json");
        let raw = tokio::fs::read_to_string(&manifest_path).await?;
        let manifest: PackageManifest =
            serde_json::from_str(&raw).map_err(|e| Error::FrameworkManifest {
                path: manifest_path.clone(),
                message: e.to_string(),
            })?;

        // Bundler module ids are real paths.
        let root = tokio::fs::canonicalize(root).await?;
        debug!(root = %root.display(), version = ?manifest.version, "located framework");

        Ok(Self {
            root,
            version: manifest.version,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    /// Absolute path of a file under `dist/`.
    pub fn dist_file(&self, name: &str) -> PathBuf {
        self.dist_dir().join(name)
    }

    /// Files whose members are specialized away, or which are replaced
    /// outright. Their own text is not evidence of application usage.
    pub fn core_files(&self) -> Vec<PathBuf> {
        [HONO_BASE_FILE, CONTEXT_FILE, REQUEST_FILE, HONO_FILE, INDEX_FILE]
            .iter()
            .map(|name| self.dist_file(name))
            .collect()
    }
}
