//! Keep manifest dependencies out of the bundle.

use rolldown_common::ResolvedExternal;
use rolldown_plugin::{HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, Plugin, PluginContext};
use std::borrow::Cow;
use std::sync::Arc;

use super::registry::{PkgupPlugin, PluginPhase};
use crate::manifest::Externals;

/// Marks `dependencies`, `peerDependencies` and `optionalDependencies`
/// (and their subpaths) external.
#[derive(Debug, Clone)]
pub struct ExternalsPlugin {
    externals: Arc<Externals>,
}

impl ExternalsPlugin {
    pub fn new(externals: Arc<Externals>) -> Self {
        Self { externals }
    }
}

impl Plugin for ExternalsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "pkgup:externals".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        rolldown_plugin::HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let external = self
            .externals
            .is_external(args.specifier)
            .then(|| args.specifier.to_string());

        async move {
            Ok(external.map(|id| HookResolveIdOutput {
                id: id.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }
}

impl PkgupPlugin for ExternalsPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Externalize
    }
}
