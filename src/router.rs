//! Router - decides what happens to one note for one trigger
//!
//! Checks run in a fixed order: rename loop guard, trigger mode, the note's
//! own disable marker, excluded folders, then the rule groups. The first
//! check that decides ends the evaluation.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::config::{Settings, TriggerMode};
use crate::notifications;
use crate::rules::{ExclusionFilter, NoteFacts, RuleEngine};
use crate::vault::{MetadataSource, MoveOutcome, Mover};

/// What caused an evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A file appeared
    Created,
    /// A file's content or metadata changed
    Modified,
    /// A file was renamed or moved from `old_path` (vault-relative)
    Renamed { old_path: String },
    /// The user asked explicitly
    Command,
}

impl Trigger {
    pub fn is_command(&self) -> bool {
        matches!(self, Trigger::Command)
    }
}

/// Which step decided, and what it decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Rename that kept the file name; most likely our own move
    LoopGuard,
    /// Event-sourced evaluation while in manual mode
    TriggerManual,
    /// The note's frontmatter disables moving
    Disabled,
    /// The note's folder is excluded
    Excluded,
    /// No rule matched
    NoMatch,
    /// Dry run: a rule matched and the note would move
    WouldMove { folder: String },
    /// The note was moved
    Moved { folder: String, to: String },
    /// A rule matched but the note already lives there
    AlreadyInPlace { folder: String },
    /// A rule matched but the mover failed
    MoveFailed { folder: String, error: String },
}

impl RouteOutcome {
    /// Destination folder, when a rule matched
    pub fn folder(&self) -> Option<&str> {
        match self {
            RouteOutcome::WouldMove { folder }
            | RouteOutcome::Moved { folder, .. }
            | RouteOutcome::AlreadyInPlace { folder }
            | RouteOutcome::MoveFailed { folder, .. } => Some(folder),
            _ => None,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, RouteOutcome::Moved { .. })
    }
}

/// Evaluates notes against a snapshot of the settings
pub struct Router<M> {
    trigger_mode: TriggerMode,
    exclusions: ExclusionFilter,
    engine: RuleEngine,
    mover: M,
    dry_run: bool,
}

impl<M: Mover> Router<M> {
    /// Snapshot `settings`; later edits need a new router
    pub fn new(settings: &Settings, mover: M) -> Self {
        Self {
            trigger_mode: settings.trigger_auto_manual,
            exclusions: ExclusionFilter::from_settings(settings),
            engine: RuleEngine::from_settings(settings),
            mover,
            dry_run: false,
        }
    }

    /// Decide without moving anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Checks that need only the path: the loop guard and the trigger gate.
    ///
    /// `Some` means the evaluation stops here.
    pub fn gate(&self, path: &str, trigger: &Trigger) -> Option<RouteOutcome> {
        if let Trigger::Renamed { old_path } = trigger
            && file_name(old_path) == file_name(path)
        {
            debug!("Rename kept the file name, ignoring: {}", path);
            return Some(RouteOutcome::LoopGuard);
        }

        if self.trigger_mode == TriggerMode::Manual && !trigger.is_command() {
            debug!("Manual trigger mode, ignoring event for {}", path);
            return Some(RouteOutcome::TriggerManual);
        }

        None
    }

    /// Resolve a path through `source` and route it.
    ///
    /// The gate runs before any metadata is read.
    pub fn route_path<S: MetadataSource>(
        &self,
        source: &S,
        path: &str,
        trigger: &Trigger,
    ) -> Result<RouteOutcome> {
        if let Some(outcome) = self.gate(path, trigger) {
            return Ok(outcome);
        }
        let note = source.resolve(path)?;
        Ok(self.decide(&note, trigger))
    }

    /// Route an already resolved note
    pub fn route(&self, note: &NoteFacts, trigger: &Trigger) -> RouteOutcome {
        if let Some(outcome) = self.gate(&note.path, trigger) {
            return outcome;
        }
        self.decide(note, trigger)
    }

    fn decide(&self, note: &NoteFacts, trigger: &Trigger) -> RouteOutcome {
        if note.disabled {
            if trigger.is_command() {
                warn!("Moving is disabled in the frontmatter of {}", note.path);
                notifications::notify_disabled(&note.path);
            } else {
                debug!("Moving is disabled in the frontmatter of {}", note.path);
            }
            return RouteOutcome::Disabled;
        }

        if self.exclusions.is_excluded(&note.folder) {
            return RouteOutcome::Excluded;
        }

        let Some(folder) = self.engine.destination(note) else {
            debug!("No rule matched {}", note.path);
            return RouteOutcome::NoMatch;
        };
        let folder = folder.to_string();

        if self.dry_run {
            return RouteOutcome::WouldMove { folder };
        }

        match self.mover.relocate(note, &folder) {
            Ok(MoveOutcome::Moved { to }) => RouteOutcome::Moved { folder, to },
            Ok(MoveOutcome::AlreadyInPlace) => {
                debug!("{} is already in '{}'", note.path, folder);
                RouteOutcome::AlreadyInPlace { folder }
            }
            Err(e) => {
                error!("Failed to move {} to '{}': {}", note.path, folder, e);
                notifications::notify_move_error(&note.path, &e.to_string());
                RouteOutcome::MoveFailed {
                    folder,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Route every file a source lists, as an explicit command
    pub fn route_all<S: MetadataSource>(
        &self,
        source: &S,
        paths: &[String],
    ) -> Vec<(String, RouteOutcome)> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            match self.route_path(source, path, &Trigger::Command) {
                Ok(outcome) => results.push((path.clone(), outcome)),
                Err(e) => warn!("Skipping {}: {:#}", path, e),
            }
        }

        let moved = results.iter().filter(|(_, o)| o.is_moved()).count();
        if moved > 0 {
            info!("Moved {} of {} files", moved, paths.len());
        }
        results
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
