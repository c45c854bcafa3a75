//! `__VERSION__` substitution.

use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};
use std::borrow::Cow;

use super::registry::{PkgupPlugin, PluginPhase};

pub(crate) const VERSION_TOKEN: &str = "__VERSION__";

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace every read of `__VERSION__` in `code` with `replacement`.
///
/// Occurrences inside longer identifiers, followed by a `.`, or on the left
/// of an assignment are left alone. Returns `None` when nothing changed.
pub(crate) fn replace_version(code: &str, replacement: &str) -> Option<String> {
    if !code.contains(VERSION_TOKEN) {
        return None;
    }

    let mut out = String::with_capacity(code.len());
    let mut rest = code;
    let mut changed = false;

    while let Some(pos) = rest.find(VERSION_TOKEN) {
        let (before, after) = rest.split_at(pos);
        let tail = &after[VERSION_TOKEN.len()..];
        out.push_str(before);

        let preceding = out.chars().next_back();
        let standalone = !preceding.is_some_and(is_ident_char)
            && !tail.chars().next().is_some_and(|c| is_ident_char(c) || c == '.');
        let trimmed = tail.trim_start();
        let assigned = trimmed.starts_with('=') && !trimmed.starts_with("==");

        if standalone && !assigned {
            out.push_str(replacement);
            changed = true;
        } else {
            out.push_str(VERSION_TOKEN);
        }
        rest = tail;
    }
    out.push_str(rest);

    changed.then_some(out)
}

/// Injects the manifest version as a string literal.
#[derive(Debug, Clone)]
pub struct VersionPlugin {
    replacement: String,
}

impl VersionPlugin {
    /// `None` substitutes `undefined`.
    pub fn new(version: Option<String>) -> Self {
        let replacement = match version {
            Some(version) => serde_json::Value::String(version).to_string(),
            None => "undefined".to_string(),
        };
        Self { replacement }
    }
}

impl Plugin for VersionPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("pkgup:version")
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let code = replace_version(args.code, &self.replacement);

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

impl PkgupPlugin for VersionPlugin {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_reads() {
        let code = "export const v = __VERSION__;\nconsole.log(__VERSION__)";
        assert_eq!(
            replace_version(code, "\"1.2.3\"").as_deref(),
            Some("export const v = \"1.2.3\";\nconsole.log(\"1.2.3\")")
        );
    }

    #[test]
    fn test_skips_identifiers_member_access_and_assignments() {
        assert_eq!(replace_version("const my__VERSION__x = 1", "\"1\""), None);
        assert_eq!(replace_version("__VERSION__.length", "\"1\""), None);
        assert_eq!(replace_version("__VERSION__ = '2'", "\"1\""), None);
        assert_eq!(
            replace_version("if (__VERSION__ == null) {}", "undefined").as_deref(),
            Some("if (undefined == null) {}")
        );
    }

    #[test]
    fn test_replaces_after_dot() {
        assert_eq!(
            replace_version("globals.__VERSION__", "\"1\"").as_deref(),
            Some("globals.\"1\"")
        );
    }

    #[test]
    fn test_version_literal_is_escaped() {
        let plugin = VersionPlugin::new(Some("1.0.0-\"beta\"".to_string()));
        assert_eq!(plugin.replacement, r#""1.0.0-\"beta\"""#);
        assert_eq!(VersionPlugin::new(None).replacement, "undefined");
    }
}
