//! The optimize pipeline: probe, analyze, specialize, emit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slim_loader::compile::resolve_entry;
use slim_loader::{Executor, LoadOptions, NodeExecutor, RuntimeEnvironment, load_with, plugin};
use tracing::{debug, info};

use crate::emit::{BuildArtifact, DEFAULT_OUTFILE, EmitOptions, emit};
use crate::framework::{FrameworkLayout, HONO_BASE_FILE};
use crate::report::OptimizationReport;
use crate::router::{CapabilityQuery, NodeCapabilityProbe, RouterChoice, choose_router};
use crate::routes::{RouteTable, extract_routes};
use crate::specialize::{
    ResolveFilter, Specialization, SpecializationToggles, SpecializeInputs, VirtualModule,
    VirtualModulePlugin, VirtualModuleRegistry, specialize,
};
use crate::usage::{UsageAnalysis, analyze, lifecycle_probe_module};
use crate::{Error, Result};

/// Options for one optimize invocation.
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub entry: PathBuf,
    pub outfile: PathBuf,
    pub minify: bool,
    pub runtime: RuntimeEnvironment,
    pub toggles: SpecializationToggles,
    /// Specifiers left unresolved in both builds.
    pub external: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Syntax level of the production build. `None` leaves syntax as written.
    pub target: Option<String>,
}

impl OptimizeOptions {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            outfile: PathBuf::from(DEFAULT_OUTFILE),
            minify: false,
            runtime: RuntimeEnvironment::default(),
            toggles: SpecializationToggles::default(),
            external: Vec::new(),
            cwd: None,
            target: None,
        }
    }

    fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::new()
            .runtime(self.runtime)
            .external(self.external.iter().cloned());
        if let Some(cwd) = &self.cwd {
            options = options.cwd(cwd.clone());
        }
        options
    }

    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            outfile: self.outfile.clone(),
            minify: self.minify,
            runtime: self.runtime,
            external: self.external.clone(),
            cwd: self.cwd.clone(),
            target: self.target.clone(),
        }
    }
}

/// Everything decided before the production build.
#[derive(Debug, Clone)]
pub struct OptimizationPlan {
    pub entry: PathBuf,
    pub layout: FrameworkLayout,
    pub routes: RouteTable,
    /// `None` when router optimization is disabled.
    pub router: Option<RouterChoice>,
    pub usage: UsageAnalysis,
    pub specialization: Specialization,
}

/// Runs the pipeline with an injected executor and capability query.
pub struct Optimizer<E, C> {
    executor: Arc<E>,
    capability: C,
}

impl Optimizer<NodeExecutor, NodeCapabilityProbe> {
    /// Node.js for both the probe run and the capability check, the latter
    /// run from `project_dir`.
    pub fn node(project_dir: impl Into<PathBuf>) -> Self {
        Self::new(NodeExecutor::new(), NodeCapabilityProbe::new(project_dir))
    }
}

impl<E, C> Optimizer<E, C>
where
    E: Executor + 'static,
    C: CapabilityQuery,
{
    pub fn new(executor: E, capability: C) -> Self {
        Self {
            executor: Arc::new(executor),
            capability,
        }
    }

    /// Probe the application and decide every specialization.
    ///
    /// Any probe build failure is returned as is; nothing past it runs.
    pub async fn plan(&self, options: &OptimizeOptions) -> Result<OptimizationPlan> {
        let load_options = options.load_options();
        let entry = resolve_entry(&options.entry, &load_options)?;
        if !tokio::fs::try_exists(&entry).await.unwrap_or(false) {
            return Err(slim_loader::Error::EntryNotFound(entry).into());
        }

        let entry_dir = entry.parent().unwrap_or(Path::new("."));
        let layout = FrameworkLayout::locate(entry_dir).await?;
        info!(
            version = layout.version().unwrap_or("unknown"),
            "probing application"
        );

        let mut probe_options = load_options;
        if options.toggles.lifecycle {
            probe_options = probe_options.plugin(plugin(VirtualModulePlugin::new(Arc::new(
                probe_registry(&layout)?,
            ))));
        }

        let executor: Arc<dyn Executor> = self.executor.clone();
        let mut apps = load_with(&entry, probe_options, executor);
        let app = apps.next().await.ok_or(Error::NoApplication)??;

        let routes = extract_routes(&app);
        debug!(routes = routes.len(), "captured route table");

        let router = if options.toggles.router {
            let router = choose_router(&routes, &self.capability).await;
            info!(router = %router, "router selected");
            Some(router)
        } else {
            debug!("router optimization disabled");
            None
        };

        let usage = analyze(app.closure(), app.unused_methods(), &layout.core_files());
        debug!(used = ?usage.used().iter().collect::<Vec<_>>(), "usage analyzed");

        let specialization = specialize(SpecializeInputs {
            layout: &layout,
            routes: &routes,
            router: router.as_ref(),
            usage: &usage,
            toggles: options.toggles,
        })
        .await?;

        Ok(OptimizationPlan {
            entry,
            layout,
            routes,
            router,
            usage,
            specialization,
        })
    }

    /// Plan, then run the production build.
    pub async fn run(&self, options: &OptimizeOptions) -> Result<OptimizationReport> {
        let plan = self.plan(options).await?;
        let artifact: BuildArtifact =
            emit(&plan.entry, &plan.specialization, &options.emit_options()).await?;

        Ok(OptimizationReport {
            router: plan.specialization.router,
            removed: plan.specialization.removed,
            artifact,
        })
    }
}

/// Virtual modules for the probe build: the instrumented base class.
fn probe_registry(layout: &FrameworkLayout) -> Result<VirtualModuleRegistry> {
    let base = layout.dist_file(HONO_BASE_FILE);
    let mut registry = VirtualModuleRegistry::new();
    registry.register(VirtualModule::new(
        "probe",
        ResolveFilter::file(&base),
        lifecycle_probe_module(&base),
    ))?;
    Ok(registry)
}
