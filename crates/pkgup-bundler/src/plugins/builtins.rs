//! Keep Node.js builtin modules out of the bundle.

use rolldown_common::ResolvedExternal;
use rolldown_plugin::{HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, Plugin, PluginContext};
use std::borrow::Cow;

use super::registry::{PkgupPlugin, PluginPhase};

/// Modules reported by `require('node:module').builtinModules`.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Specifier to emit for a builtin import, or `None` for anything else.
///
/// `node:fs` is always a builtin and is emitted as `fs`.
pub(crate) fn builtin_id(specifier: &str) -> Option<&str> {
    match specifier.strip_prefix("node:") {
        Some(bare) => Some(bare),
        None => NODE_BUILTINS.contains(&specifier).then_some(specifier),
    }
}

/// Marks `fs`, `node:fs` and friends external.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeBuiltinsPlugin;

impl Plugin for NodeBuiltinsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "pkgup:node-builtins".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        rolldown_plugin::HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let id = builtin_id(args.specifier).map(str::to_string);

        async move {
            Ok(id.map(|id| HookResolveIdOutput {
                id: id.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }
}

impl PkgupPlugin for NodeBuiltinsPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Externalize
    }
}
