//! Vault - the directory tree of notes being organized
//!
//! Resolves files into [`NoteFacts`] for the rule engine and performs the
//! physical moves the router decides on.

pub mod frontmatter;
mod mover;

pub use mover::{FsMover, MoveError, MoveOutcome, Mover};

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tracing::trace;

use crate::rules::NoteFacts;

/// Source of resolved note metadata
pub trait MetadataSource {
    /// Resolve a vault-relative path into facts the matcher can use
    fn resolve(&self, path: &str) -> Result<NoteFacts>;
}

/// A vault rooted at a directory
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a vault-relative path
    pub fn absolute(&self, relative: &str) -> PathBuf {
        let relative = crate::normalize_path(relative);
        if relative == "/" {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Vault-relative, `/`-separated form of a path inside the vault.
    ///
    /// `None` for paths outside the root or for the root itself.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let stripped = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = stripped
            .components()
            .map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Option<_>>()?;

        (!parts.is_empty()).then(|| parts.join("/"))
    }

    /// Hidden files and anything under a hidden directory are never routed
    pub fn is_ignored(relative: &str) -> bool {
        relative.split('/').any(|part| part.starts_with('.'))
    }

    /// All routable files, vault-relative and sorted
    pub fn files(&self) -> Result<Vec<String>> {
        let mut result = Vec::new();
        self.walk(&self.root, &mut result)
            .with_context(|| format!("Failed to scan vault {}", self.root.display()))?;
        result.sort();
        Ok(result)
    }

    fn walk(&self, dir: &Path, result: &mut Vec<String>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let ft = entry.file_type()?;
            if ft.is_symlink() {
                // Skip symlinks to avoid potential loops
                continue;
            }

            let path = entry.path();
            let Some(relative) = self.relative(&path) else {
                continue;
            };
            if Self::is_ignored(&relative) {
                trace!("Ignoring hidden path: {}", relative);
                continue;
            }

            if ft.is_dir() {
                self.walk(&path, result)?;
            } else {
                result.push(relative);
            }
        }
        Ok(())
    }
}

impl MetadataSource for Vault {
    fn resolve(&self, path: &str) -> Result<NoteFacts> {
        let mut note = NoteFacts::from_path(path);

        // Only markdown carries tags and frontmatter
        if note.extension.eq_ignore_ascii_case("md") {
            let absolute = self.absolute(&note.path);
            let content = std::fs::read_to_string(&absolute)
                .with_context(|| format!("Failed to read note {}", absolute.display()))?;
            let metadata = frontmatter::parse(&content);
            note.tags = metadata.tags;
            note.properties = metadata.properties;
            note.disabled = metadata.disabled;
        }

        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths() {
        let vault = Vault::new("/vault");
        assert_eq!(
            vault.relative(Path::new("/vault/Inbox/a.md")),
            Some("Inbox/a.md".to_string())
        );
        assert_eq!(vault.relative(Path::new("/vault")), None);
        assert_eq!(vault.relative(Path::new("/elsewhere/a.md")), None);
        assert_eq!(vault.absolute("/"), PathBuf::from("/vault"));
        assert_eq!(vault.absolute("Inbox/"), PathBuf::from("/vault/Inbox"));
    }

    #[test]
    fn test_hidden_paths_ignored() {
        assert!(Vault::is_ignored(".obsidian/workspace.json"));
        assert!(Vault::is_ignored("Inbox/.draft.md"));
        assert!(!Vault::is_ignored("Inbox/draft.md"));
    }

    #[test]
    fn test_files_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Inbox")).unwrap();
        std::fs::create_dir_all(dir.path().join(".trash")).unwrap();
        std::fs::write(
            dir.path().join("Inbox").join("Plan.md"),
            "---\nstatus: Done\n---\nWork on #proj\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::write(dir.path().join(".trash").join("old.md"), "#proj").unwrap();

        let vault = Vault::new(dir.path());
        assert_eq!(vault.files().unwrap(), vec!["Inbox/Plan.md", "image.png"]);

        let note = vault.resolve("Inbox/Plan.md").unwrap();
        assert_eq!(note.folder, "Inbox");
        assert_eq!(note.tags, vec!["#proj"]);
        assert_eq!(note.property("status"), Some(&["Done".to_string()][..]));

        let image = vault.resolve("image.png").unwrap();
        assert!(image.tags.is_empty());
        assert_eq!(image.basename, "image");
    }
}
