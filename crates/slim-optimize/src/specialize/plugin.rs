//! Serves registered virtual modules to Rolldown.

use std::borrow::Cow;
use std::sync::Arc;

use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use tracing::trace;

use super::registry::{VIRTUAL_QUERY, VirtualModuleRegistry, resolve_relative};

/// Redirects framework imports to their specialized replacements.
///
/// Relative imports made *from* a virtual module are resolved against the
/// real file's directory, since Rolldown cannot derive a directory from a
/// query-suffixed id on its own.
#[derive(Debug, Clone)]
pub struct VirtualModulePlugin {
    registry: Arc<VirtualModuleRegistry>,
}

impl VirtualModulePlugin {
    pub fn new(registry: Arc<VirtualModuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &VirtualModuleRegistry {
        &self.registry
    }
}

fn resolved(id: String) -> HookResolveIdReturn {
    Ok(Some(HookResolveIdOutput {
        id: id.into(),
        external: Some(ResolvedExternal::Bool(false)),
        ..Default::default()
    }))
}

impl Plugin for VirtualModulePlugin {
    fn name(&self) -> Cow<'static, str> {
        "slim:virtual-modules".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(str::to_string);
        let registry = Arc::clone(&self.registry);

        async move {
            if let Some(module) = registry.resolve(&specifier, importer.as_deref()) {
                trace!(%specifier, id = %module.id, "redirected to virtual module");
                return resolved(module.id.clone());
            }

            match importer.as_deref() {
                Some(importer) if importer.contains(VIRTUAL_QUERY) => {
                    match resolve_relative(&specifier, importer) {
                        Some(target) => resolved(target.to_string_lossy().into_owned()),
                        None => Ok(None),
                    }
                }
                _ => Ok(None),
            }
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let registry = Arc::clone(&self.registry);

        async move {
            let Some(module) = registry.get(&id) else {
                return Ok(None);
            };
            Ok(Some(HookLoadOutput {
                code: module.content.to_string().into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}
