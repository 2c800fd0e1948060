//! In-memory compilation of an entry graph with Rolldown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, BundlerTransformOptions, Either,
    InputItem, IsExternal, JsxOptions, OutputFormat, RawMinifyOptions, ResolveOptions,
    SourceMapType, TsConfig,
};
use rolldown_common::Output;
use tracing::debug;

use crate::app::SourceClosure;
use crate::diagnostics::{BuildDiagnostic, DiagnosticKind};
use crate::options::LoadOptions;
use crate::plugins::{PluginPhase, PluginRegistry, SourceClosurePlugin};
use crate::target::ExportConditions;
use crate::{Error, Result};

/// What the compiled bundle is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Analysis build that will be evaluated by the execution harness.
    /// Emitted as CommonJS so externals can be supplied through `require`.
    Probe,
    /// Final artifact, emitted as a single ES module.
    Production { minify: bool },
}

/// A successfully compiled entry graph.
#[derive(Debug, Clone)]
pub struct CompiledBundle {
    /// Absolute entry path.
    pub entry: PathBuf,
    /// Directory resolution was performed from.
    pub cwd: PathBuf,
    pub code: String,
    /// Specifiers the bundle still imports at runtime.
    pub externals: Vec<String>,
    pub closure: SourceClosure,
}

/// Resolve `entry` against the options' working directory and clean it.
pub fn resolve_entry(entry: &Path, options: &LoadOptions) -> Result<PathBuf> {
    let entry = if entry.is_absolute() {
        entry.to_path_buf()
    } else {
        let base = match &options.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir()?,
        };
        base.join(entry)
    };
    Ok(entry.clean())
}

/// Compile `entry` and every module it reaches into one in-memory chunk.
///
/// Nothing is written to disk. Plugins from `options` run after the loader's
/// virtual-phase plugins and before the closure collector.
pub async fn compile(
    entry: impl AsRef<Path>,
    options: &LoadOptions,
    mode: BuildMode,
) -> Result<CompiledBundle> {
    let entry = resolve_entry(entry.as_ref(), options)?;
    if !tokio::fs::try_exists(&entry).await.unwrap_or(false) {
        return Err(Error::EntryNotFound(entry));
    }

    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => entry
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let bundler_options = configure_rolldown_options(&entry, &cwd, options, mode);

    let collector = Arc::new(SourceClosurePlugin::new());
    let mut registry = PluginRegistry::new();
    for plugin in &options.plugins {
        registry.add(Arc::clone(plugin), PluginPhase::Transform);
    }
    registry.add(collector.clone(), PluginPhase::PostProcess);

    debug!(entry = %entry.display(), ?mode, "compiling entry graph");

    let mut bundler = RolldownBundlerBuilder::default()
        .with_options(bundler_options)
        .with_plugins(registry.into_rolldown_plugins())
        .build()
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    let output = bundler
        .generate()
        .await
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    let mut chunks: Vec<(String, Vec<String>)> = output
        .assets
        .iter()
        .filter_map(|asset| match asset {
            Output::Chunk(chunk) => Some((
                chunk.code.clone(),
                chunk.imports.iter().map(ToString::to_string).collect(),
            )),
            Output::Asset(_) => None,
        })
        .collect();

    let (code, externals) = match chunks.len() {
        1 => chunks.remove(0),
        0 => {
            return Err(Error::Bundler(vec![BuildDiagnostic::new(
                DiagnosticKind::Other,
                "build produced no output chunk",
            )]));
        }
        n => {
            return Err(Error::Bundler(vec![BuildDiagnostic::new(
                DiagnosticKind::Other,
                format!("entry graph split into {n} chunks; dynamic imports must stay within one bundle"),
            )]));
        }
    };

    let closure = collector.take();
    debug!(modules = closure.len(), bytes = code.len(), "compiled entry graph");

    Ok(CompiledBundle {
        entry,
        cwd,
        code,
        externals,
        closure,
    })
}

fn configure_rolldown_options(
    entry: &Path,
    cwd: &Path,
    options: &LoadOptions,
    mode: BuildMode,
) -> BundlerOptions {
    let conditions = options.runtime.conditions();

    let mut bundler_options = BundlerOptions {
        input: Some(vec![InputItem {
            name: Some("index".to_string()),
            import: entry.to_string_lossy().into_owned(),
        }]),
        cwd: Some(cwd.to_path_buf()),
        platform: Some(options.runtime.platform()),
        external: Some(IsExternal::from(options.external.clone())),
        resolve: Some(configure_resolution(cwd, &conditions)),
        transform: Some(configure_transform(options)),
        tsconfig: Some(TsConfig::Auto),
        inline_dynamic_imports: Some(true),
        ..Default::default()
    };

    if options.sourcemap {
        bundler_options.sourcemap = Some(SourceMapType::Inline);
    }

    match mode {
        BuildMode::Probe => {
            bundler_options.format = Some(OutputFormat::Cjs);
        }
        BuildMode::Production { minify } => {
            bundler_options.format = Some(OutputFormat::Esm);
            if minify {
                bundler_options.minify = Some(RawMinifyOptions::from(true));
            }
        }
    }

    bundler_options
}

/// JSX compiles against the automatic runtime of `options.jsx_import_source`
/// and syntax is lowered to `options.target` when one is set. Explicit values
/// take precedence over a nearby tsconfig.json.
fn configure_transform(options: &LoadOptions) -> BundlerTransformOptions {
    BundlerTransformOptions {
        jsx: Some(Either::Right(JsxOptions {
            runtime: Some("automatic".to_string()),
            import_source: Some(options.jsx_import_source.clone()),
            ..Default::default()
        })),
        target: options.target.clone().map(Either::Left),
        ..Default::default()
    }
}

/// Module resolution: every ancestor `node_modules`, the target's export
/// conditions, and the TS/JSX extensions applications are written in.
fn configure_resolution(cwd: &Path, conditions: &ExportConditions) -> ResolveOptions {
    let modules = cwd
        .ancestors()
        .map(|dir| dir.join("node_modules").to_string_lossy().into_owned())
        .chain(std::iter::once("node_modules".to_string()))
        .collect();

    ResolveOptions {
        main_fields: Some(conditions.main_fields()),
        condition_names: Some(conditions.to_vec()),
        extensions: Some(
            [".ts", ".tsx", ".mts", ".js", ".jsx", ".mjs", ".cjs", ".json"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        ),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}
