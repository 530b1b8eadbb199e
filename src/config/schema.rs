//! Configuration schema

use serde::Serialize;
use std::fmt;

/// Canonical settings, the only shape the rest of the crate sees.
///
/// Persisted field names are part of the on-disk contract and must not change.
/// Scalars come before the lists so the TOML encoding stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Whether file events trigger evaluation or only explicit commands
    pub trigger_auto_manual: TriggerMode,

    /// Compare rule tags as regular expressions instead of exact strings
    pub use_regex_to_check_for_tags: bool,

    /// Print/log the `[A]`/`[M]` trigger indicator
    #[serde(rename = "statusBar_trigger_indicator")]
    pub status_bar_trigger_indicator: bool,

    /// Compare excluded folders as regular expressions instead of paths
    pub use_regex_to_check_for_excluded_folder: bool,

    /// Rule groups, tried top to bottom
    #[serde(rename = "folder_tag_pattern")]
    pub groups: Vec<RuleGroup>,

    /// Folders whose notes are never moved
    #[serde(rename = "excluded_folder")]
    pub excluded: Vec<ExclusionEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trigger_auto_manual: TriggerMode::default(),
            use_regex_to_check_for_tags: false,
            status_bar_trigger_indicator: true,
            use_regex_to_check_for_excluded_folder: false,
            groups: vec![RuleGroup::default()],
            excluded: vec![ExclusionEntry::default()],
        }
    }
}

impl Settings {
    /// Number of rules across all groups, inert ones included
    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }
}

/// When evaluation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TriggerMode {
    /// On create, modify and rename notifications as well as commands
    #[default]
    Automatic,
    /// Only on explicit commands
    Manual,
}

impl TriggerMode {
    /// Parse a persisted mode name (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("automatic") {
            Some(TriggerMode::Automatic)
        } else if value.eq_ignore_ascii_case("manual") {
            Some(TriggerMode::Manual)
        } else {
            None
        }
    }

    /// Short status indicator
    pub fn indicator(&self) -> &'static str {
        match self {
            TriggerMode::Automatic => "[A]",
            TriggerMode::Manual => "[M]",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TriggerMode::Automatic => TriggerMode::Manual,
            TriggerMode::Manual => TriggerMode::Automatic,
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMode::Automatic => f.write_str("Automatic"),
            TriggerMode::Manual => f.write_str("Manual"),
        }
    }
}

/// A destination folder and the rules that send notes there
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleGroup {
    /// Destination folder, relative to the vault root
    pub folder: String,

    /// Never empty; an inert rule stands in for "no rules"
    pub rules: Vec<Rule>,
}

impl Default for RuleGroup {
    fn default() -> Self {
        Self {
            folder: String::new(),
            rules: vec![Rule::default()],
        }
    }
}

impl RuleGroup {
    pub fn new(folder: impl Into<String>, rules: Vec<Rule>) -> Self {
        let mut rules = rules;
        if rules.is_empty() {
            rules.push(Rule::default());
        }
        Self {
            folder: folder.into(),
            rules,
        }
    }
}

/// One conjunction of criteria. All non-empty categories must pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Rule {
    /// Tags, each including the leading `#`
    pub tags: Vec<String>,

    /// `key:value` entries matched exactly against frontmatter
    #[serde(rename = "frontmatterProperties")]
    pub frontmatter_properties: Vec<String>,

    /// Regular expressions tested against the note's basename
    pub patterns: Vec<String>,
}

impl Rule {
    /// A rule without any criteria; it never matches
    pub fn is_inert(&self) -> bool {
        self.tags.is_empty() && self.frontmatter_properties.is_empty() && self.patterns.is_empty()
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frontmatter_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }
}

/// A folder excluded from routing. An empty folder is a no-op entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExclusionEntry {
    pub folder: String,
}

impl ExclusionEntry {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_shape() {
        let settings = Settings::default();
        assert_eq!(settings.trigger_auto_manual, TriggerMode::Automatic);
        assert!(!settings.use_regex_to_check_for_tags);
        assert!(settings.status_bar_trigger_indicator);
        assert_eq!(settings.groups.len(), 1);
        assert!(settings.groups[0].rules[0].is_inert());
        assert_eq!(settings.excluded, vec![ExclusionEntry::default()]);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["trigger_auto_manual"], "Automatic");
        assert_eq!(json["statusBar_trigger_indicator"], true);
        assert!(json["folder_tag_pattern"][0]["rules"][0]["frontmatterProperties"].is_array());
        assert_eq!(json["excluded_folder"][0]["folder"], "");
    }

    #[test]
    fn test_group_never_empty() {
        let group = RuleGroup::new("Inbox", Vec::new());
        assert_eq!(group.rules.len(), 1);
        assert!(group.rules[0].is_inert());
    }

    #[test]
    fn test_trigger_mode_parse() {
        assert_eq!(TriggerMode::parse("Manual"), Some(TriggerMode::Manual));
        assert_eq!(TriggerMode::parse("automatic"), Some(TriggerMode::Automatic));
        assert_eq!(TriggerMode::parse("sometimes"), None);
        assert_eq!(TriggerMode::Manual.toggled(), TriggerMode::Automatic);
        assert_eq!(TriggerMode::Automatic.indicator(), "[A]");
    }
}
