//! Configuration management

pub mod editor;
pub mod migrate;
mod schema;

pub use editor::{Category, Direction, EditError};
pub use schema::{ExclusionEntry, Rule, RuleGroup, Settings, TriggerMode};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk encoding, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

impl Settings {
    /// Load settings from a file or the default location.
    ///
    /// A missing file yields defaults. Any readable file, whatever generation
    /// of the schema it was written with, is migrated into canonical form.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = resolve(path)?;

        if !config_path.exists() {
            debug!(
                "No settings at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read settings from {}", config_path.display()))?;

        Self::parse(&content, Format::of(&config_path))
            .with_context(|| format!("Failed to parse settings from {}", config_path.display()))
    }

    fn parse(content: &str, format: Format) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: serde_json::Value = match format {
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => {
                let table: toml::Table = toml::from_str(content)?;
                serde_json::to_value(table)?
            }
        };

        Ok(migrate::normalize(&raw))
    }

    /// Save settings to a file (with advisory file locking)
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = resolve(path)?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let content = match Format::of(&config_path) {
            Format::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize settings")?
            }
            Format::Toml => toml::to_string_pretty(self).context("Failed to serialize settings")?,
        };

        // Use a lockfile to prevent concurrent writes
        let mut lock_name = config_path.as_os_str().to_owned();
        lock_name.push(".lock");
        let lock_path = PathBuf::from(lock_name);
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

        use fs2::FileExt;
        lock_file
            .lock_exclusive()
            .with_context(|| "Failed to acquire settings file lock")?;

        let result = std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write settings to {}", config_path.display()));

        let _ = lock_file.unlock();

        result
    }

    /// Get the default settings file path
    /// Uses the platform config directory (via dirs::config_dir), falling back to ~/.config
    pub fn default_path() -> Option<PathBuf> {
        let config_base =
            dirs::config_dir().or_else(|| dirs::home_dir().map(|d| d.join(".config")))?;
        Some(config_base.join("notemover").join("settings.json"))
    }
}

fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    path.map(crate::expand_path)
        .or_else(Settings::default_path)
        .context("Could not determine settings path")
}
