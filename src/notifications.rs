//! Desktop notifications
//!
//! Only the few conditions a user must see: a command aimed at a note that
//! opted out, and moves that could not be carried out.

use notify_rust::{Notification, Timeout};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Global flag to enable/disable notifications
static NOTIFICATIONS_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize notifications with the enabled setting
pub fn init(enabled: bool) {
    NOTIFICATIONS_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Check if notifications are enabled
pub fn is_enabled() -> bool {
    NOTIFICATIONS_ENABLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy)]
pub enum NotificationKind {
    /// A command targeted a note that disables moving
    Disabled,
    /// A decided move failed
    MoveError,
    /// Watch folder issue
    WatchError,
    /// Trigger mode switched
    Trigger,
}

impl NotificationKind {
    fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Disabled => "dialog-information",
            NotificationKind::MoveError => "dialog-error",
            NotificationKind::WatchError => "dialog-warning",
            NotificationKind::Trigger => "dialog-information",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            NotificationKind::Disabled => "Note Skipped",
            NotificationKind::MoveError => "Move Error",
            NotificationKind::WatchError => "Watch Error",
            NotificationKind::Trigger => "Trigger",
        }
    }
}

/// Send a notification if enabled
///
/// This is fire-and-forget - errors are logged but don't propagate.
pub fn notify(kind: NotificationKind, message: &str) {
    if !is_enabled() {
        return;
    }

    let result = Notification::new()
        .appname("NoteMover")
        .summary(&format!("NoteMover: {}", kind.prefix()))
        .body(message)
        .icon(kind.icon())
        .timeout(Timeout::Milliseconds(5000))
        .show();

    if let Err(e) = result {
        warn!("Failed to send notification: {}", e);
    }
}

pub fn notify_disabled(path: &str) {
    notify(
        NotificationKind::Disabled,
        &format!("'{}' is disabled in the frontmatter", path),
    );
}

pub fn notify_move_error(path: &str, error: &str) {
    notify(
        NotificationKind::MoveError,
        &format!("Could not move '{}': {}", path, error),
    );
}

pub fn notify_watch_error(path: &str, error: &str) {
    notify(
        NotificationKind::WatchError,
        &format!("Watch '{}': {}", path, error),
    );
}

pub fn notify_trigger(mode: &str) {
    notify(NotificationKind::Trigger, &format!("Trigger is {}", mode));
}
