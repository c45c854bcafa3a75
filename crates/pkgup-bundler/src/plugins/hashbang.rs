//! Strip `#!` lines from module sources.
//!
//! Executables get a fresh `#!/usr/bin/env node` when their output is
//! written, so sources carrying their own would otherwise end up with the
//! line in the middle of a bundle.

use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};
use std::borrow::Cow;

use super::registry::{PkgupPlugin, PluginPhase};

/// `code` without its leading hashbang line, or `None` if it has none.
pub(crate) fn strip_hashbang(code: &str) -> Option<&str> {
    if !code.starts_with("#!") {
        return None;
    }
    Some(code.find('\n').map_or("", |newline| &code[newline + 1..]))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StripHashbangPlugin;

impl Plugin for StripHashbangPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("pkgup:strip-hashbang")
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let code = strip_hashbang(args.code).map(str::to_string);

        async move {
            Ok(code.map(|code| HookTransformOutput {
                code: Some(code),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }
}

impl PkgupPlugin for StripHashbangPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}
