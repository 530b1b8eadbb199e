//! Moving notes into their destination folders

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::normalize_path;
use crate::rules::NoteFacts;

/// Why a decided move did not happen
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("destination folder \"{0}\" does not exist")]
    DestinationMissing(String),

    #[error("a file named \"{name}\" already exists in \"{folder}\"")]
    NameCollision { name: String, folder: String },

    #[error("failed to move {from} to {to}: {source}")]
    Io {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a successful relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The note now lives at this vault-relative path
    Moved { to: String },
    /// The note was already in the destination folder
    AlreadyInPlace,
}

/// Performs the physical relocation decided by the router
pub trait Mover {
    /// Move a note into `folder`, relative to the vault root
    fn relocate(&self, note: &NoteFacts, folder: &str) -> Result<MoveOutcome, MoveError>;
}

/// Moves files within a vault directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsMover {
    root: PathBuf,
}

impl FsMover {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Mover for FsMover {
    fn relocate(&self, note: &NoteFacts, folder: &str) -> Result<MoveOutcome, MoveError> {
        let folder = normalize_path(folder);
        let dest_dir = if folder == "/" {
            self.root.clone()
        } else {
            self.root.join(&folder)
        };

        if !dest_dir.is_dir() {
            return Err(MoveError::DestinationMissing(folder));
        }

        let name = note.full_name();
        let new_path = if folder == "/" {
            name.clone()
        } else {
            format!("{}/{}", folder, name)
        };

        if new_path == note.path {
            return Ok(MoveOutcome::AlreadyInPlace);
        }

        let target = dest_dir.join(&name);
        if target.exists() {
            return Err(MoveError::NameCollision { name, folder });
        }

        let source = self.root.join(&note.path);
        std::fs::rename(&source, &target).map_err(|e| MoveError::Io {
            from: note.path.clone(),
            to: new_path.clone(),
            source: e,
        })?;

        info!("Moved {} -> {}", note.path, new_path);
        Ok(MoveOutcome::Moved { to: new_path })
    }
}
