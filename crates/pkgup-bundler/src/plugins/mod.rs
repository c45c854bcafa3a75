//! Rolldown plugins used for module plans.

mod builtins;
mod externals;
mod hashbang;
pub(crate) mod registry;
mod typescript_js;
mod version;

pub use builtins::NodeBuiltinsPlugin;
pub use externals::ExternalsPlugin;
pub use hashbang::StripHashbangPlugin;
pub use typescript_js::TypeScriptJsPlugin;
pub use version::VersionPlugin;

pub(crate) use registry::{PkgupPlugin, PluginPhase, PluginRegistry};
