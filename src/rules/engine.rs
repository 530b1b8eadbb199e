//! Rule engine - evaluates rule groups in order

use tracing::{debug, trace};

use super::NoteFacts;
use crate::config::{RuleGroup, Settings};

/// The rule that decided a note's destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    /// Destination folder of the matching group
    pub folder: &'a str,
    /// Position of the group
    pub group: usize,
    /// Position of the rule within the group
    pub rule: usize,
}

/// Engine for evaluating rule groups against notes
pub struct RuleEngine {
    groups: Vec<RuleGroup>,
    use_regex_for_tags: bool,
}

impl RuleEngine {
    /// Create a new rule engine with the given groups
    pub fn new(groups: Vec<RuleGroup>, use_regex_for_tags: bool) -> Self {
        Self {
            groups,
            use_regex_for_tags,
        }
    }

    /// Snapshot the rule groups of canonical settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.groups.clone(), settings.use_regex_to_check_for_tags)
    }

    /// Find the first matching rule, scanning groups then rules in order.
    ///
    /// The first hit ends the scan; later groups are never consulted.
    pub fn evaluate(&self, note: &NoteFacts) -> Option<RuleMatch<'_>> {
        for (g, group) in self.groups.iter().enumerate() {
            for (r, rule) in group.rules.iter().enumerate() {
                if rule.is_inert() {
                    trace!("Skipping inert rule {} of group {}", r + 1, g + 1);
                    continue;
                }

                if rule.matches(note, self.use_regex_for_tags) {
                    debug!(
                        "Rule {} of group {} ('{}') matched: {}",
                        r + 1,
                        g + 1,
                        group.folder,
                        note.path
                    );
                    return Some(RuleMatch {
                        folder: &group.folder,
                        group: g,
                        rule: r,
                    });
                }
            }
        }

        None
    }

    /// Destination folder for a note, if any rule matches
    pub fn destination(&self, note: &NoteFacts) -> Option<&str> {
        self.evaluate(note).map(|m| m.folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rule;

    #[test]
    fn test_evaluate_matching_group() {
        let engine = RuleEngine::new(
            vec![RuleGroup::new(
                "Projects",
                vec![Rule::default().with_tags(["#proj"])],
            )],
            false,
        );

        let note = NoteFacts::from_path("Plan.md").with_tags(["#proj", "#2024"]);
        assert_eq!(engine.destination(&note), Some("Projects"));

        let note = NoteFacts::from_path("Plan.md").with_tags(["#home"]);
        assert_eq!(engine.destination(&note), None);
    }

    #[test]
    fn test_missing_property_value_is_no_match() {
        let engine = RuleEngine::new(
            vec![RuleGroup::new(
                "Done",
                vec![Rule::default().with_properties(["status: Done"])],
            )],
            false,
        );

        let note = NoteFacts::from_path("Task.md").with_property("status", ["InProgress"]);
        assert_eq!(engine.evaluate(&note), None);
    }

    #[test]
    fn test_earlier_group_wins() {
        let engine = RuleEngine::new(
            vec![
                RuleGroup::new("First", vec![Rule::default().with_tags(["#a"])]),
                RuleGroup::new("Second", vec![Rule::default().with_tags(["#a"])]),
            ],
            false,
        );

        let note = NoteFacts::from_path("n.md").with_tags(["#a"]);
        let hit = engine.evaluate(&note).unwrap();
        assert_eq!(hit.folder, "First");
        assert_eq!(hit.group, 0);
    }

    #[test]
    fn test_earlier_rule_within_group_wins() {
        let engine = RuleEngine::new(
            vec![RuleGroup::new(
                "Notes",
                vec![
                    Rule::default().with_tags(["#x"]),
                    Rule::default().with_patterns(["^Daily"]),
                    Rule::default().with_tags(["#a"]),
                ],
            )],
            false,
        );

        let note = NoteFacts::from_path("Daily 2024.md").with_tags(["#a"]);
        let hit = engine.evaluate(&note).unwrap();
        assert_eq!(hit.rule, 1);
    }

    #[test]
    fn test_inert_rules_and_groups_skipped() {
        let engine = RuleEngine::new(
            vec![
                RuleGroup::new("Catchall", vec![Rule::default()]),
                RuleGroup::new("Tagged", vec![Rule::default(), Rule::default().with_tags(["#a"])]),
            ],
            false,
        );

        let untagged = NoteFacts::from_path("n.md");
        assert_eq!(engine.destination(&untagged), None);

        let tagged = NoteFacts::from_path("n.md").with_tags(["#a"]);
        assert_eq!(engine.destination(&tagged), Some("Tagged"));
    }

    #[test]
    fn test_invalid_pattern_falls_through_to_next_rule() {
        let engine = RuleEngine::new(
            vec![
                RuleGroup::new(
                    "Broken",
                    vec![Rule::default().with_tags(["#a"]).with_patterns(["(unclosed"])],
                ),
                RuleGroup::new("Fallback", vec![Rule::default().with_tags(["#a"])]),
            ],
            false,
        );

        let note = NoteFacts::from_path("Meeting.md").with_tags(["#a"]);
        assert_eq!(engine.destination(&note), Some("Fallback"));
    }

    #[test]
    fn test_from_settings_uses_tag_regex_toggle() {
        let mut settings = Settings::default();
        settings.groups = vec![RuleGroup::new(
            "Areas",
            vec![Rule::default().with_tags(["^#area/"])],
        )];
        let note = NoteFacts::from_path("n.md").with_tags(["#area/work"]);

        assert_eq!(RuleEngine::from_settings(&settings).destination(&note), None);

        settings.use_regex_to_check_for_tags = true;
        assert_eq!(
            RuleEngine::from_settings(&settings).destination(&note),
            Some("Areas")
        );
    }
}
