//! Excluded folders - notes inside them are never moved

use tracing::debug;

use super::condition::cached_regex;
use crate::config::{ExclusionEntry, Settings};
use crate::normalize_path;

/// Tests a note's containing folder against the exclusion list
pub struct ExclusionFilter {
    entries: Vec<ExclusionEntry>,
    use_regex: bool,
}

impl ExclusionFilter {
    pub fn new(entries: Vec<ExclusionEntry>, use_regex: bool) -> Self {
        Self { entries, use_regex }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.excluded.clone(),
            settings.use_regex_to_check_for_excluded_folder,
        )
    }

    /// True when the first non-empty entry matching `folder` is found.
    ///
    /// Without regex, entries compare equal to the normalized folder path.
    /// With regex, an entry is searched in the path; an invalid expression
    /// is skipped and the scan continues.
    pub fn is_excluded(&self, folder: &str) -> bool {
        let folder = normalize_path(folder);

        for entry in &self.entries {
            if entry.folder.is_empty() {
                continue;
            }

            let hit = if self.use_regex {
                cached_regex(&entry.folder, "excluded folder")
                    .is_some_and(|regex| regex.is_match(&folder))
            } else {
                normalize_path(&entry.folder) == folder
            };

            if hit {
                debug!("Folder '{}' excluded by '{}'", folder, entry.folder);
                return true;
            }
        }

        false
    }
}
