//! Migration of persisted settings into the canonical schema
//!
//! Three generations of rule-group entries exist on disk:
//!
//! 1. flat: `{folder, tag, frontmatterProperty, pattern}`
//! 2. array-valued: `{folder, tags, frontmatterProperties, patterns}`
//! 3. nested (current): `{folder, rules: [{tags, frontmatterProperties, patterns}]}`
//!
//! Generations 1 and 2 (and any mix of their fields) are read as one legacy
//! rule. Shape detection lives here and nowhere else; everything downstream
//! only sees [`Settings`].

use serde_json::{Map, Value};
use tracing::debug;

use super::schema::{ExclusionEntry, Rule, RuleGroup, Settings, TriggerMode};

/// A rule-group entry as found on disk
#[derive(Debug)]
enum StoredGroup<'a> {
    /// Current shape with a `rules` array
    Nested {
        folder: String,
        rules: &'a [Value],
    },
    /// Flat or array-valued fields directly on the entry
    Legacy { folder: String, rule: StoredRule<'a> },
}

/// Rule fields as found on disk, either generation
#[derive(Debug, Default)]
struct StoredRule<'a> {
    tags: Criterion<'a>,
    properties: Criterion<'a>,
    patterns: Criterion<'a>,
}

/// One criterion list: the array-valued field wins over the single-valued one
#[derive(Debug, Default)]
struct Criterion<'a> {
    many: Option<&'a [Value]>,
    one: Option<&'a str>,
}

impl<'a> StoredGroup<'a> {
    fn classify(entry: &'a Value) -> Self {
        let Some(fields) = entry.as_object() else {
            return StoredGroup::Legacy {
                folder: String::new(),
                rule: StoredRule::default(),
            };
        };
        let folder = string_field(fields, "folder").unwrap_or_default().to_string();

        match fields.get("rules").and_then(Value::as_array) {
            Some(rules) => StoredGroup::Nested { folder, rules },
            None => StoredGroup::Legacy {
                folder,
                rule: StoredRule::from_fields(fields),
            },
        }
    }
}

impl<'a> StoredRule<'a> {
    fn classify(value: &'a Value) -> Self {
        value.as_object().map(Self::from_fields).unwrap_or_default()
    }

    fn from_fields(fields: &'a Map<String, Value>) -> Self {
        Self {
            tags: Criterion::read(fields, "tags", "tag"),
            properties: Criterion::read(fields, "frontmatterProperties", "frontmatterProperty"),
            patterns: Criterion::read(fields, "patterns", "pattern"),
        }
    }
}

impl<'a> Criterion<'a> {
    fn read(fields: &'a Map<String, Value>, many: &str, one: &str) -> Self {
        Self {
            many: fields.get(many).and_then(Value::as_array).map(Vec::as_slice),
            one: string_field(fields, one),
        }
    }

    fn into_list(self) -> Vec<String> {
        match (self.many, self.one) {
            (Some(values), _) => values.iter().filter_map(clean).collect(),
            (None, Some(value)) => clean_str(value).into_iter().collect(),
            (None, None) => Vec::new(),
        }
    }
}

impl From<StoredRule<'_>> for Rule {
    fn from(stored: StoredRule<'_>) -> Self {
        Rule {
            tags: stored.tags.into_list(),
            frontmatter_properties: stored.properties.into_list(),
            patterns: stored.patterns.into_list(),
        }
    }
}

impl From<StoredGroup<'_>> for RuleGroup {
    fn from(stored: StoredGroup<'_>) -> Self {
        match stored {
            StoredGroup::Nested { folder, rules } => RuleGroup::new(
                folder,
                rules
                    .iter()
                    .map(|r| Rule::from(StoredRule::classify(r)))
                    .collect(),
            ),
            StoredGroup::Legacy { folder, rule } => RuleGroup::new(folder, vec![rule.into()]),
        }
    }
}

/// Normalize any previously persisted value into canonical settings.
///
/// Never fails: fields of an unexpected type are treated as absent and
/// receive their defaults. Normalizing an already canonical value yields an
/// equal value.
pub fn normalize(raw: &Value) -> Settings {
    let defaults = Settings::default();
    let Some(fields) = raw.as_object() else {
        if !raw.is_null() {
            debug!("Persisted settings are not an object; using defaults");
        }
        return defaults;
    };

    let trigger_auto_manual = match string_field(fields, "trigger_auto_manual") {
        Some(value) => TriggerMode::parse(value).unwrap_or_else(|| {
            debug!("Unknown trigger mode '{}', using default", value);
            defaults.trigger_auto_manual
        }),
        None => defaults.trigger_auto_manual,
    };

    let groups = match fields.get("folder_tag_pattern").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .map(|e| RuleGroup::from(StoredGroup::classify(e)))
            .collect(),
        None => defaults.groups,
    };

    let excluded = match fields.get("excluded_folder").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .map(|e| {
                let folder = e
                    .as_object()
                    .and_then(|o| string_field(o, "folder"))
                    .unwrap_or_default();
                ExclusionEntry::new(folder)
            })
            .collect(),
        None => defaults.excluded,
    };

    Settings {
        trigger_auto_manual,
        use_regex_to_check_for_tags: bool_field(fields, "use_regex_to_check_for_tags")
            .unwrap_or(defaults.use_regex_to_check_for_tags),
        status_bar_trigger_indicator: bool_field(fields, "statusBar_trigger_indicator")
            .unwrap_or(defaults.status_bar_trigger_indicator),
        use_regex_to_check_for_excluded_folder: bool_field(
            fields,
            "use_regex_to_check_for_excluded_folder",
        )
        .unwrap_or(defaults.use_regex_to_check_for_excluded_folder),
        groups,
        excluded,
    }
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key).and_then(Value::as_bool)
}

fn clean(value: &Value) -> Option<String> {
    value.as_str().and_then(clean_str)
}

fn clean_str(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renormalize(settings: &Settings) -> Settings {
        normalize(&serde_json::to_value(settings).unwrap())
    }

    #[test]
    fn test_absent_config_uses_defaults() {
        assert_eq!(normalize(&Value::Null), Settings::default());
        assert_eq!(normalize(&json!("garbage")), Settings::default());
        assert_eq!(normalize(&json!({})), Settings::default());
    }

    #[test]
    fn test_flat_legacy_group() {
        let settings = normalize(&json!({
            "folder_tag_pattern": [{"folder": "X", "tag": "#a", "pattern": "^Meeting"}]
        }));

        assert_eq!(
            settings.groups,
            vec![RuleGroup::new(
                "X",
                vec![Rule::default().with_tags(["#a"]).with_patterns(["^Meeting"])]
            )]
        );
    }

    #[test]
    fn test_array_legacy_group() {
        let settings = normalize(&json!({
            "folder_tag_pattern": [{
                "folder": "Work",
                "tags": [" #work ", "", "#client"],
                "frontmatterProperties": ["status: Active"],
                "patterns": []
            }]
        }));

        let rule = &settings.groups[0].rules[0];
        assert_eq!(settings.groups[0].rules.len(), 1);
        assert_eq!(rule.tags, vec!["#work", "#client"]);
        assert_eq!(rule.frontmatter_properties, vec!["status: Active"]);
        assert!(rule.patterns.is_empty());
    }

    #[test]
    fn test_array_field_wins_over_single_field() {
        let settings = normalize(&json!({
            "folder_tag_pattern": [{"folder": "A", "tag": "#old", "tags": ["#new"]}]
        }));
        assert_eq!(settings.groups[0].rules[0].tags, vec!["#new"]);

        // A non-array plural field is absent, so the singular one is used
        let settings = normalize(&json!({
            "folder_tag_pattern": [{"folder": "A", "tag": "#old", "tags": "#new"}]
        }));
        assert_eq!(settings.groups[0].rules[0].tags, vec!["#old"]);
    }

    #[test]
    fn test_nested_rules_normalized_individually() {
        let settings = normalize(&json!({
            "folder_tag_pattern": [{
                "folder": "Projects",
                "rules": [
                    {"tags": ["#proj", 42, "  "]},
                    {"frontmatterProperty": "type: project"},
                    "not a rule"
                ]
            }]
        }));

        let rules = &settings.groups[0].rules;
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].tags, vec!["#proj"]);
        assert_eq!(rules[1].frontmatter_properties, vec!["type: project"]);
        assert!(rules[2].is_inert());
    }

    #[test]
    fn test_empty_rule_list_gets_inert_rule() {
        let settings = normalize(&json!({
            "folder_tag_pattern": [{"folder": "Empty", "rules": []}, {"folder": "Bare"}]
        }));

        for group in &settings.groups {
            assert_eq!(group.rules.len(), 1);
            assert!(group.rules[0].is_inert());
        }
    }

    #[test]
    fn test_wrong_types_are_defaulted() {
        let settings = normalize(&json!({
            "trigger_auto_manual": 3,
            "use_regex_to_check_for_tags": "yes",
            "statusBar_trigger_indicator": false,
            "folder_tag_pattern": {"folder": "x"},
            "excluded_folder": [{"folder": 7}, "Archive", {"folder": "Templates"}]
        }));

        assert_eq!(settings.trigger_auto_manual, TriggerMode::Automatic);
        assert!(!settings.use_regex_to_check_for_tags);
        assert!(!settings.status_bar_trigger_indicator);
        assert_eq!(settings.groups, Settings::default().groups);
        assert_eq!(
            settings.excluded,
            vec![
                ExclusionEntry::new(""),
                ExclusionEntry::new(""),
                ExclusionEntry::new("Templates")
            ]
        );
    }

    #[test]
    fn test_manual_mode_survives() {
        let settings = normalize(&json!({"trigger_auto_manual": "Manual"}));
        assert_eq!(settings.trigger_auto_manual, TriggerMode::Manual);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            Value::Null,
            json!({"folder_tag_pattern": [{"folder": "X", "tag": " #a ", "pattern": "^Meeting"}]}),
            json!({
                "trigger_auto_manual": "Manual",
                "use_regex_to_check_for_tags": true,
                "folder_tag_pattern": [
                    {"folder": "A", "tags": ["#a", "#b"], "frontmatterProperty": "k: v"},
                    {"folder": "B", "rules": [{"tags": ["#b"]}, {}, {"patterns": ["x", " "]}]},
                    {"folder": "C", "rules": []}
                ],
                "excluded_folder": [{"folder": "Archive"}, {}],
                "unknown": {"ignored": true}
            }),
        ];

        for input in inputs {
            let once = normalize(&input);
            let twice = renormalize(&once);
            assert_eq!(once, twice);
            assert_eq!(twice, renormalize(&twice));
        }
    }
}
