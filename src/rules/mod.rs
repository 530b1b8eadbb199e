//! Rule engine - matching notes against rule groups

mod condition;
mod engine;
mod exclusion;

pub use condition::{PropertyEntry, RegexIssue, check_regexes};
pub use engine::{RuleEngine, RuleMatch};
pub use exclusion::ExclusionFilter;

use indexmap::IndexMap;

/// Everything the matcher needs to know about one note.
///
/// Resolved by the content index before evaluation; the engine never touches
/// storage itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFacts {
    /// Path relative to the vault root, `/`-separated
    pub path: String,

    /// File name without extension
    pub basename: String,

    /// Extension without the dot (may be empty)
    pub extension: String,

    /// Containing folder relative to the vault root; `/` for the root itself
    pub folder: String,

    /// Tags including the leading `#`, inline and frontmatter combined
    pub tags: Vec<String>,

    /// Frontmatter values by key
    pub properties: IndexMap<String, Vec<String>>,

    /// The note asks not to be moved
    pub disabled: bool,
}

impl NoteFacts {
    /// Identity-only facts for a vault-relative path
    pub fn from_path(path: &str) -> Self {
        let path = crate::normalize_path(path);
        let (folder, file_name) = match path.rsplit_once('/') {
            Some((folder, name)) => (folder.to_string(), name),
            None => ("/".to_string(), path.as_str()),
        };
        let (basename, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (file_name, ""),
        };

        Self {
            basename: basename.to_string(),
            extension: extension.to_string(),
            folder,
            path: path.clone(),
            ..Default::default()
        }
    }

    /// Basename plus extension
    pub fn full_name(&self) -> String {
        full_name(&self.basename, &self.extension)
    }

    /// Values declared for a frontmatter key, if any
    pub fn property(&self, key: &str) -> Option<&[String]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }
}

pub(crate) fn full_name(basename: &str, extension: &str) -> String {
    if extension.is_empty() {
        basename.to_string()
    } else {
        format!("{}.{}", basename, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facts_from_nested_path() {
        let note = NoteFacts::from_path("Inbox/2024/Meeting notes.md");
        assert_eq!(note.folder, "Inbox/2024");
        assert_eq!(note.basename, "Meeting notes");
        assert_eq!(note.extension, "md");
        assert_eq!(note.full_name(), "Meeting notes.md");
    }

    #[test]
    fn test_facts_at_root() {
        let note = NoteFacts::from_path("todo.md");
        assert_eq!(note.folder, "/");
        assert_eq!(note.path, "todo.md");

        let note = NoteFacts::from_path(".hidden");
        assert_eq!(note.basename, ".hidden");
        assert_eq!(note.extension, "");
        assert_eq!(note.full_name(), ".hidden");
    }
}
