//! Production build of the specialized application.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slim_loader::{BuildMode, LoadOptions, RuntimeEnvironment, compile, plugin};
use tracing::{debug, info};

use crate::specialize::{Specialization, VirtualModulePlugin};
use crate::{Error, Result};

/// Default artifact location, relative to the project directory.
pub const DEFAULT_OUTFILE: &str = "dist/index.js";

/// Settings for the production build.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub outfile: PathBuf,
    pub minify: bool,
    pub runtime: RuntimeEnvironment,
    pub external: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub target: Option<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            outfile: PathBuf::from(DEFAULT_OUTFILE),
            minify: false,
            runtime: RuntimeEnvironment::default(),
            external: Vec::new(),
            cwd: None,
            target: None,
        }
    }
}

/// A written build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Build `entry` with every virtual module of `specialization` substituted in
/// and write the single-file result to `options.outfile`.
pub async fn emit(
    entry: &Path,
    specialization: &Specialization,
    options: &EmitOptions,
) -> Result<BuildArtifact> {
    let mut load_options = LoadOptions::new()
        .runtime(options.runtime)
        .external(options.external.iter().cloned());
    if let Some(cwd) = &options.cwd {
        load_options = load_options.cwd(cwd.clone());
    }
    if let Some(target) = &options.target {
        load_options = load_options.target(target.clone());
    }
    if !specialization.is_empty() {
        let registry = Arc::new(specialization.registry.clone());
        load_options = load_options.plugin(plugin(VirtualModulePlugin::new(registry)));
    }

    debug!(
        modules = specialization.registry.len(),
        minify = options.minify,
        "starting production build"
    );
    let bundle = compile(
        entry,
        &load_options,
        BuildMode::Production {
            minify: options.minify,
        },
    )
    .await?;

    let path = resolve_outfile(&options.outfile, options.cwd.as_deref())?;
    write_atomic(&path, bundle.code.as_bytes()).await?;

    let size = bundle.code.len() as u64;
    info!(path = %path.display(), size, "wrote artifact");
    Ok(BuildArtifact { path, size })
}

fn resolve_outfile(outfile: &Path, cwd: Option<&Path>) -> Result<PathBuf> {
    if outfile.is_absolute() {
        return Ok(outfile.to_path_buf());
    }
    let base = match cwd {
        Some(cwd) => cwd.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(base.join(outfile))
}

/// Write to a sibling temp file and rename it over `path`, so readers never
/// see a partial artifact.
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::WriteFailure {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|e| Error::WriteFailure {
            path: temp_path.clone(),
            message: e.to_string(),
        })?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::WriteFailure {
            path: path.to_path_buf(),
            message: e.to_string(),
        });
    }
    Ok(())
}
