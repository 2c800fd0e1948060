//! Plugin ordering and the built-in source closure collector.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;
use rolldown_plugin::{
    __inner::SharedPluginable, HookTransformArgs, HookTransformReturn, HookUsage, Plugin,
    TransformPluginContext,
};

use crate::app::SourceClosure;

/// Plugin execution phases.
///
/// Plugins are handed to Rolldown in phase order (lower numbers first), so a
/// virtual module is always claimed before ordinary resolution sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Virtual module resolution (always first)
    Virtual = 0,
    /// Content transformation
    Transform = 20,
    /// Observation of the final module set
    PostProcess = 100,
}

/// Plugin registry that keeps plugins in phase order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plugin: SharedPluginable, phase: PluginPhase) {
        self.plugins.push((phase, plugin));
    }

    /// Plugins sorted by phase. The sort is stable, so insertion order is
    /// preserved inside a phase.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.plugins.sort_by_key(|(phase, _)| *phase);
        self.plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Values that can be converted into a `SharedPluginable`.
pub trait IntoPlugin {
    fn into_plugin(self) -> SharedPluginable;
}

pub struct PluginHandle<P>(P);

/// Wrap a concrete plugin so it can be passed to [`crate::LoadOptions::plugin`].
pub fn plugin<P>(plugin: P) -> PluginHandle<P>
where
    P: Plugin + 'static,
{
    PluginHandle(plugin)
}

impl IntoPlugin for SharedPluginable {
    fn into_plugin(self) -> SharedPluginable {
        self
    }
}

impl<T> IntoPlugin for Arc<T>
where
    T: Plugin + 'static,
{
    fn into_plugin(self) -> SharedPluginable {
        self
    }
}

impl<P> IntoPlugin for PluginHandle<P>
where
    P: Plugin + 'static,
{
    fn into_plugin(self) -> SharedPluginable {
        Arc::new(self.0)
    }
}

/// Records the source text of every module that passes through the build.
///
/// The collected closure is what the usage analyzer scans; it includes
/// framework modules and virtual modules, identified by their resolved ids.
#[derive(Debug, Default)]
pub struct SourceClosurePlugin {
    closure: Arc<Mutex<SourceClosure>>,
}

impl SourceClosurePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> SourceClosure {
        std::mem::take(&mut *self.closure.lock())
    }
}

impl Plugin for SourceClosurePlugin {
    fn name(&self) -> Cow<'static, str> {
        "slim:source-closure".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: Arc<TransformPluginContext>,
        args: &HookTransformArgs,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let closure = Arc::clone(&self.closure);
        let id = args.id.to_string();
        let code = args.code.to_string();

        async move {
            closure.lock().insert(id, code);
            Ok(None)
        }
    }
}
