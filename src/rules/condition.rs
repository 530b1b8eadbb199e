//! Rule criteria - tags, frontmatter properties and title patterns

use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

use super::NoteFacts;
use crate::config::{Rule, Settings};

// Simple thread-local cache for compiled patterns.
// Capped at 1000 entries; cleared entirely when the cap is exceeded.
const CACHE_MAX_ENTRIES: usize = 1000;

std::thread_local! {
    static REGEX_CACHE: std::cell::RefCell<HashMap<String, Regex>> = std::cell::RefCell::new(HashMap::new());
}

impl Rule {
    /// Check whether a note satisfies every category of this rule.
    ///
    /// An empty category imposes no constraint. An inert rule never matches.
    pub fn matches(&self, note: &NoteFacts, use_regex_for_tags: bool) -> bool {
        if self.is_inert() {
            return false;
        }

        matches_tags(&self.tags, &note.tags, use_regex_for_tags)
            && matches_properties(&self.frontmatter_properties, note)
            && matches_patterns(&self.patterns, &note.basename)
    }
}

/// Every rule tag must find at least one note tag
fn matches_tags(rule_tags: &[String], note_tags: &[String], use_regex: bool) -> bool {
    if rule_tags.is_empty() {
        return true;
    }
    if note_tags.is_empty() {
        return false;
    }

    rule_tags.iter().all(|rule_tag| {
        if rule_tag.is_empty() {
            return false;
        }
        if !use_regex {
            return note_tags.iter().any(|tag| tag == rule_tag);
        }
        match cached_regex(rule_tag, "tag") {
            Some(regex) => note_tags.iter().any(|tag| regex.is_match(tag)),
            None => false,
        }
    })
}

/// Every `key:value` entry must be an exact member of the note's values for `key`
fn matches_properties(entries: &[String], note: &NoteFacts) -> bool {
    entries.iter().all(|entry| {
        let Some(parsed) = PropertyEntry::parse(entry) else {
            return false;
        };
        note.property(parsed.key)
            .is_some_and(|values| values.iter().any(|v| v == parsed.value))
    })
}

/// Every pattern must be found in the basename
fn matches_patterns(patterns: &[String], basename: &str) -> bool {
    patterns.iter().all(|pattern| {
        !pattern.is_empty()
            && cached_regex(pattern, "title pattern").is_some_and(|regex| regex.is_match(basename))
    })
}

/// A `key:value` frontmatter criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEntry<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl<'a> PropertyEntry<'a> {
    /// Split on the first `:`. Missing colon, empty key or empty value is `None`.
    pub fn parse(entry: &'a str) -> Option<Self> {
        let (key, value) = entry.split_once(':')?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self { key, value })
    }
}

/// Compile a user-supplied pattern through the cache.
///
/// Invalid patterns are logged with what they were meant for and yield `None`.
pub(crate) fn cached_regex(pattern: &str, what: &str) -> Option<Regex> {
    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(r) = cache.get(pattern) {
            return Some(r.clone());
        }
        if cache.len() >= CACHE_MAX_ENTRIES {
            cache.clear();
        }
        match Regex::new(pattern) {
            Ok(r) => {
                cache.insert(pattern.to_string(), r.clone());
                Some(r)
            }
            Err(e) => {
                warn!("Invalid {} regex \"{}\": {}", what, pattern, e);
                None
            }
        }
    })
}

/// A configured string that will never match, found by [`check_regexes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexIssue {
    /// Where the string lives, e.g. `group 1 rule 2 pattern`
    pub location: String,
    pub value: String,
    pub reason: String,
}

/// Report every configured string that can never match: invalid regexes
/// (tags only when tag regexes are on, exclusions only when exclusion regexes
/// are on) and malformed `key:value` entries.
pub fn check_regexes(settings: &Settings) -> Vec<RegexIssue> {
    let mut issues = Vec::new();
    let mut check = |location: String, value: &str| {
        if let Err(e) = Regex::new(value) {
            issues.push(RegexIssue {
                location,
                value: value.to_string(),
                reason: e.to_string(),
            });
        }
    };

    for (g, group) in settings.groups.iter().enumerate() {
        for (r, rule) in group.rules.iter().enumerate() {
            if settings.use_regex_to_check_for_tags {
                for tag in &rule.tags {
                    check(format!("group {} rule {} tag", g + 1, r + 1), tag);
                }
            }
            for pattern in &rule.patterns {
                check(format!("group {} rule {} pattern", g + 1, r + 1), pattern);
            }
        }
    }

    if settings.use_regex_to_check_for_excluded_folder {
        for (i, entry) in settings.excluded.iter().enumerate() {
            if !entry.folder.is_empty() {
                check(format!("excluded folder {}", i + 1), &entry.folder);
            }
        }
    }

    for (g, group) in settings.groups.iter().enumerate() {
        for (r, rule) in group.rules.iter().enumerate() {
            for entry in &rule.frontmatter_properties {
                if PropertyEntry::parse(entry).is_none() {
                    issues.push(RegexIssue {
                        location: format!("group {} rule {} property", g + 1, r + 1),
                        value: entry.clone(),
                        reason: "expected key:value".to_string(),
                    });
                }
            }
        }
    }

    issues
}
