//! The `exports` field of `package.json`.
//!
//! Conditional exports nest arbitrarily: a subpath maps to a target string,
//! a list of fallbacks, or an object of conditions, each of which may nest
//! again. [`parse_exports`] walks the tree depth first, in document order,
//! and yields one [`ExportRecord`] per relative target.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::registry::infer_format;
use super::{EntryFormat, Provenance};

/// Platform condition that is recorded on the entries it guards.
const NODE_CONDITION: &str = "node";

/// A node of the `exports` tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportsField {
    /// `null`, an explicitly excluded subpath.
    Null,
    /// `"./dist/index.js"`
    Target(String),
    /// `["./dist/a.js", { "import": "./dist/b.mjs" }]`
    Fallbacks(Vec<ExportsField>),
    /// `{ ".": ..., "import": ..., "types": ... }`
    Conditions(IndexMap<String, ExportsField>),
}

/// One target discovered while walking `exports`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Target path as written (`./dist/index.mjs`).
    pub output: String,
    pub format: EntryFormat,
    pub provenance: Provenance,
    /// `node` when the target sits directly under a `node` key.
    pub condition: Option<String>,
}

/// Walk an `exports` tree.
///
/// `default_format` is the format inferred for targets whose extension does
/// not decide it (the manifest's `type`). Targets under a `types` key are
/// always declarations. Bare specifiers (not starting with `.`) are skipped.
/// Records are not deduplicated.
pub fn parse_exports(
    field: &ExportsField,
    from: Provenance,
    default_format: EntryFormat,
) -> Vec<ExportRecord> {
    let mut records = Vec::new();
    walk(field, from, default_format, &mut records);
    records
}

fn walk(
    field: &ExportsField,
    from: Provenance,
    default_format: EntryFormat,
    records: &mut Vec<ExportRecord>,
) {
    match field {
        ExportsField::Null => {}
        ExportsField::Target(target) => {
            if let Some(record) = target_record(target, None, from, default_format, None) {
                records.push(record);
            }
        }
        ExportsField::Fallbacks(list) => {
            for (index, item) in list.iter().enumerate() {
                walk(item, from.index(index), default_format, records);
            }
        }
        ExportsField::Conditions(map) => {
            for (key, value) in map {
                let provenance = from.key(key.as_str());
                match value {
                    ExportsField::Target(target) => {
                        let condition = (key == NODE_CONDITION).then(|| key.clone());
                        if let Some(record) = target_record(
                            target,
                            Some(key),
                            provenance,
                            default_format,
                            condition,
                        ) {
                            records.push(record);
                        }
                    }
                    nested => walk(nested, provenance, default_format, records),
                }
            }
        }
    }
}

fn target_record(
    target: &str,
    key: Option<&str>,
    provenance: Provenance,
    default_format: EntryFormat,
    condition: Option<String>,
) -> Option<ExportRecord> {
    if !target.starts_with('.') {
        return None;
    }

    let format = if key == Some("types") {
        EntryFormat::TypeDeclaration
    } else {
        infer_format(target, default_format)
    };

    Some(ExportRecord {
        output: target.to_string(),
        format,
        provenance,
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ManifestField;

    fn parse(json: &str) -> Vec<ExportRecord> {
        let field: ExportsField = serde_json::from_str(json).unwrap();
        parse_exports(
            &field,
            Provenance::field(ManifestField::Exports),
            EntryFormat::EcmaScriptModule,
        )
    }

    fn summary(records: &[ExportRecord]) -> Vec<(String, String, EntryFormat)> {
        records
            .iter()
            .map(|r| (r.provenance.to_string(), r.output.clone(), r.format))
            .collect()
    }

    #[test]
    fn test_deserializes_every_shape() {
        let field: ExportsField = serde_json::from_str(
            r#"{ ".": [null, "./a.js", { "import": "./b.mjs" }], "./x": null }"#,
        )
        .unwrap();
        let ExportsField::Conditions(map) = field else {
            panic!("expected conditions");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![".", "./x"]);
        assert_eq!(map["./x"], ExportsField::Null);
        assert!(matches!(&map["."], ExportsField::Fallbacks(list) if list.len() == 3));
    }

    #[test]
    fn test_string_exports() {
        assert_eq!(
            summary(&parse(r#""./dist/index.js""#)),
            vec![(
                "exports".to_string(),
                "./dist/index.js".to_string(),
                EntryFormat::EcmaScriptModule
            )]
        );
        assert!(parse(r#""some-package""#).is_empty());
        assert!(parse("null").is_empty());
    }

    #[test]
    fn test_conditional_exports_in_document_order() {
        let records = parse(
            r#"{
                ".": {
                    "types": "./dist/index.d.ts",
                    "import": "./dist/index.mjs",
                    "require": "./dist/index.cjs"
                },
                "./utils": "./dist/utils.js"
            }"#,
        );
        assert_eq!(
            summary(&records),
            vec![
                (
                    "exports...types".to_string(),
                    "./dist/index.d.ts".to_string(),
                    EntryFormat::TypeDeclaration
                ),
                (
                    "exports...import".to_string(),
                    "./dist/index.mjs".to_string(),
                    EntryFormat::EcmaScriptModule
                ),
                (
                    "exports...require".to_string(),
                    "./dist/index.cjs".to_string(),
                    EntryFormat::CommonJs
                ),
                (
                    "exports../utils".to_string(),
                    "./dist/utils.js".to_string(),
                    EntryFormat::EcmaScriptModule
                ),
            ]
        );
    }

    #[test]
    fn test_import_and_require_on_same_path_are_distinct_records() {
        let records = parse(r#"{ "import": "./dist/index.js", "require": "./dist/index.js" }"#);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].provenance.to_string(), "exports.import");
        assert_eq!(records[1].provenance.to_string(), "exports.require");
    }

    #[test]
    fn test_fallback_arrays_are_indexed() {
        let records = parse(r#"[{ "default": "./dist/a.js" }, "./dist/b.js", "pkg"]"#);
        assert_eq!(
            summary(&records),
            vec![
                (
                    "exports[0].default".to_string(),
                    "./dist/a.js".to_string(),
                    EntryFormat::EcmaScriptModule
                ),
                (
                    "exports[1]".to_string(),
                    "./dist/b.js".to_string(),
                    EntryFormat::EcmaScriptModule
                ),
            ]
        );
    }

    #[test]
    fn test_node_condition_is_recorded() {
        let records = parse(
            r#"{ ".": { "node": "./dist/node.js", "default": "./dist/index.js" } }"#,
        );
        assert_eq!(records[0].condition.as_deref(), Some("node"));
        assert_eq!(records[0].provenance.to_string(), "exports...node");
        assert_eq!(records[1].condition, None);
    }

    #[test]
    fn test_nested_conditions() {
        let records = parse(
            r#"{ "node": { "import": "./dist/node.mjs" }, "default": "./dist/browser.js" }"#,
        );
        assert_eq!(records[0].provenance.to_string(), "exports.node.import");
        assert_eq!(records[0].format, EntryFormat::EcmaScriptModule);
        assert_eq!(records[1].provenance.to_string(), "exports.default");
    }

    #[test]
    fn test_bare_specifiers_under_conditions_are_skipped() {
        let records = parse(r#"{ "import": "other-pkg", "types": "./dist/index.d.ts" }"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].format, EntryFormat::TypeDeclaration);
    }

    #[test]
    fn test_default_format_applies_to_plain_js() {
        let field: ExportsField = serde_json::from_str(r#"{ "require": "./dist/index.js" }"#).unwrap();
        let records = parse_exports(
            &field,
            Provenance::field(ManifestField::Exports),
            EntryFormat::CommonJs,
        );
        assert_eq!(records[0].format, EntryFormat::CommonJs);
    }
}
