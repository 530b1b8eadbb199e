//! Positional editing of settings
//!
//! Groups, rules and exclusion entries are addressed by index. Every
//! operation keeps the invariant that a group holds at least one rule.
//! Callers persist after each successful edit.

use thiserror::Error;

use super::schema::{ExclusionEntry, Rule, RuleGroup, Settings, TriggerMode};

/// An edit addressed something that does not exist
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no rule group at position {0}")]
    Group(usize),

    #[error("rule group {group} has no rule at position {rule}")]
    Rule { group: usize, rule: usize },

    #[error("no excluded folder at position {0}")]
    Exclusion(usize),
}

/// Which way to shift an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Criterion list of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Tags,
    Properties,
    Patterns,
}

impl Settings {
    /// Append a group with one inert rule; returns its position
    pub fn add_group(&mut self, folder: &str) -> usize {
        self.groups
            .push(RuleGroup::new(folder.trim(), vec![Rule::default()]));
        self.groups.len() - 1
    }

    pub fn remove_group(&mut self, group: usize) -> Result<RuleGroup, EditError> {
        self.group_mut(group)?;
        Ok(self.groups.remove(group))
    }

    /// Shift a group one position. Moving past either end is a no-op.
    pub fn move_group(&mut self, group: usize, direction: Direction) -> Result<(), EditError> {
        self.group_mut(group)?;
        shift(&mut self.groups, group, direction);
        Ok(())
    }

    pub fn set_group_folder(&mut self, group: usize, folder: &str) -> Result<(), EditError> {
        self.group_mut(group)?.folder = folder.trim().to_string();
        Ok(())
    }

    /// Append an inert rule to a group; returns its position
    pub fn add_rule(&mut self, group: usize) -> Result<usize, EditError> {
        let rules = &mut self.group_mut(group)?.rules;
        rules.push(Rule::default());
        Ok(rules.len() - 1)
    }

    /// Remove a rule. Removing the last rule leaves an inert one in its place.
    pub fn remove_rule(&mut self, group: usize, rule: usize) -> Result<Rule, EditError> {
        let rules = &mut self.group_mut(group)?.rules;
        if rule >= rules.len() {
            return Err(EditError::Rule { group, rule });
        }

        let removed = rules.remove(rule);
        if rules.is_empty() {
            rules.push(Rule::default());
        }
        Ok(removed)
    }

    /// Replace one criterion list from comma-separated input
    pub fn set_rule_criteria(
        &mut self,
        group: usize,
        rule: usize,
        category: Category,
        input: &str,
    ) -> Result<(), EditError> {
        let target = self
            .group_mut(group)?
            .rules
            .get_mut(rule)
            .ok_or(EditError::Rule { group, rule })?;

        let values = split_list(input);
        match category {
            Category::Tags => target.tags = values,
            Category::Properties => target.frontmatter_properties = values,
            Category::Patterns => target.patterns = values,
        }
        Ok(())
    }

    /// Append an exclusion entry; returns its position
    pub fn add_exclusion(&mut self, folder: &str) -> usize {
        self.excluded.push(ExclusionEntry::new(folder));
        self.excluded.len() - 1
    }

    pub fn remove_exclusion(&mut self, index: usize) -> Result<ExclusionEntry, EditError> {
        self.exclusion_mut(index)?;
        Ok(self.excluded.remove(index))
    }

    pub fn move_exclusion(&mut self, index: usize, direction: Direction) -> Result<(), EditError> {
        self.exclusion_mut(index)?;
        shift(&mut self.excluded, index, direction);
        Ok(())
    }

    pub fn set_exclusion_folder(&mut self, index: usize, folder: &str) -> Result<(), EditError> {
        self.exclusion_mut(index)?.folder = folder.to_string();
        Ok(())
    }

    /// Flip between automatic and manual triggering; returns the new mode
    pub fn toggle_trigger(&mut self) -> TriggerMode {
        self.trigger_auto_manual = self.trigger_auto_manual.toggled();
        self.trigger_auto_manual
    }

    fn group_mut(&mut self, group: usize) -> Result<&mut RuleGroup, EditError> {
        self.groups.get_mut(group).ok_or(EditError::Group(group))
    }

    fn exclusion_mut(&mut self, index: usize) -> Result<&mut ExclusionEntry, EditError> {
        self.excluded
            .get_mut(index)
            .ok_or(EditError::Exclusion(index))
    }
}

fn shift<T>(items: &mut [T], index: usize, direction: Direction) {
    let target = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|&t| t < items.len()),
    };
    if let Some(target) = target {
        items.swap(index, target);
    }
}

/// Split comma-separated editor input, dropping blanks
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
