//! Plugin registry with execution phases.
//!
//! Rolldown runs plugins in the order it receives them. The registry sorts
//! pkgup's plugins by phase so externalization always wins over resolution
//! rewrites, and source rewrites happen after resolution.

use rolldown_plugin::{Plugin, __inner::SharedPluginable};
use std::sync::Arc;

/// Plugin execution phases, lower numbers first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PluginPhase {
    /// Decide which specifiers never enter the bundle.
    Externalize = 0,

    /// Rewrite how the remaining specifiers resolve.
    Resolve = 10,

    /// Rewrite module source text.
    Transform = 20,
}

/// A Rolldown plugin that knows its phase.
pub(crate) trait PkgupPlugin: Plugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Plugins kept in phase order.
#[derive(Default)]
pub(crate) struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin under its own phase.
    pub fn add<P: PkgupPlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        let plugin_arc: SharedPluginable = Arc::new(plugin);
        self.plugins.push((phase, plugin_arc));
    }

    /// Stable: insertion order is kept within a phase.
    fn sort(&mut self) {
        self.plugins.sort_by_key(|(phase, _)| *phase);
    }

    /// Plugins sorted by phase.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.sort();
        self.plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }
}
