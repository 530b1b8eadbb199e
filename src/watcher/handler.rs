//! Debouncing of file system events
//!
//! Events are collected per path and a note is routed once its events have
//! gone quiet, so the last edit of a burst is the one evaluated.

use indexmap::IndexMap;
use std::time::{Duration, Instant};

use crate::router::Trigger;

/// Maximum number of suppressed paths before forcing a cleanup
const MAX_DEBOUNCE_ENTRIES: usize = 10_000;

/// Latest trigger seen for a path and when it arrived
struct Pending {
    trigger: Trigger,
    last: Instant,
}

/// Debounces file system events to avoid evaluating a note mid-edit
pub struct EventHandler {
    /// Paths waiting for quiet (IndexMap preserves arrival order for fair routing)
    pending: IndexMap<String, Pending>,

    /// Paths we just moved notes to, whose echo events are dropped
    suppressed: IndexMap<String, Instant>,

    /// Debounce duration
    debounce: Duration,
}

impl EventHandler {
    /// Create a new event handler with the given debounce duration
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: IndexMap::new(),
            suppressed: IndexMap::new(),
            debounce,
        }
    }

    /// Record an event for a path, replacing any earlier trigger.
    ///
    /// Returns false when the path is suppressed and the event was dropped.
    pub fn record(&mut self, path: &str, trigger: Trigger) -> bool {
        let now = Instant::now();
        if self
            .suppressed
            .get(path)
            .is_some_and(|&at| now.duration_since(at) < self.debounce)
        {
            return false;
        }

        self.pending.insert(
            path.to_string(),
            Pending {
                trigger,
                last: now,
            },
        );
        true
    }

    /// Take every path that has been quiet for the debounce period
    pub fn take_due(&mut self) -> Vec<(String, Trigger)> {
        self.take_due_at(Instant::now())
    }

    fn take_due_at(&mut self, now: Instant) -> Vec<(String, Trigger)> {
        let debounce = self.debounce;
        let mut due = Vec::new();
        self.pending.retain(|path, pending| {
            if now.duration_since(pending.last) >= debounce {
                due.push((path.clone(), pending.trigger.clone()));
                false
            } else {
                true
            }
        });
        due
    }

    /// Drop a pending path, e.g. after the note was renamed away from it
    pub fn forget(&mut self, path: &str) {
        self.pending.shift_remove(path);
    }

    /// Ignore events for `path` during the next debounce period
    pub fn suppress(&mut self, path: &str) {
        self.pending.shift_remove(path);
        self.suppressed.insert(path.to_string(), Instant::now());

        // If the map has grown too large, force a cleanup
        if self.suppressed.len() > MAX_DEBOUNCE_ENTRIES {
            self.cleanup();
        }
    }

    /// Clean up expired suppressions (call periodically)
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let debounce = self.debounce;

        self.suppressed
            .retain(|_, &mut at| now.duration_since(at) < debounce);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_routes_once_with_latest_trigger() {
        let mut handler = EventHandler::new(Duration::from_secs(60));

        assert!(handler.record("Inbox/a.md", Trigger::Created));
        assert!(handler.record("Inbox/a.md", Trigger::Modified));

        // Still inside the window
        assert!(handler.take_due().is_empty());

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(
            handler.take_due_at(later),
            vec![("Inbox/a.md".to_string(), Trigger::Modified)]
        );
        assert!(handler.take_due_at(later).is_empty());
    }

    #[test]
    fn test_paths_are_independent() {
        let mut handler = EventHandler::new(Duration::ZERO);
        handler.record("a.md", Trigger::Modified);
        handler.record("b.md", Trigger::Created);

        let due = handler.take_due();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].0, "a.md");
        assert_eq!(due[1].0, "b.md");
    }

    #[test]
    fn test_forget_drops_pending() {
        let mut handler = EventHandler::new(Duration::ZERO);
        handler.record("a.md", Trigger::Modified);
        handler.forget("a.md");
        assert!(handler.take_due().is_empty());
    }

    #[test]
    fn test_suppressed_path_ignores_echo() {
        let mut handler = EventHandler::new(Duration::from_secs(60));
        handler.suppress("Projects/a.md");
        assert!(!handler.record("Projects/a.md", Trigger::Created));
        assert!(handler.take_due_at(Instant::now() + Duration::from_secs(61)).is_empty());
    }

    #[test]
    fn test_cleanup_drops_expired_suppressions() {
        let mut handler = EventHandler::new(Duration::ZERO);
        handler.suppress("a.md");
        handler.cleanup();
        assert!(handler.suppressed.is_empty());
        assert!(handler.record("a.md", Trigger::Modified));
    }
}
