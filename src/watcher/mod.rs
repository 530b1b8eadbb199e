//! File system watcher

mod handler;

pub use handler::EventHandler;

use anyhow::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::router::{RouteOutcome, Router, Trigger};
use crate::vault::{FsMover, Vault};

/// Watches a vault and routes notes as they are created, edited or renamed
pub struct Watcher {
    watcher: RecommendedWatcher,
    router: Router<FsMover>,
    vault: Vault,
    rx: mpsc::Receiver<Result<notify::Event, notify::Error>>,
    event_handler: EventHandler,
    files_moved: Arc<AtomicU64>,
}

impl Watcher {
    /// Create a new watcher for the given vault and router
    pub fn new(
        vault: Vault,
        router: Router<FsMover>,
        polling_interval_secs: u64,
        debounce: Duration,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Failed to send watch event: {}", e);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(polling_interval_secs)),
        )?;

        Ok(Self {
            watcher,
            router,
            vault,
            rx,
            event_handler: EventHandler::new(debounce),
            files_moved: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Start watching the whole vault
    pub fn watch(&mut self) -> Result<()> {
        if let Err(e) = self
            .watcher
            .watch(self.vault.root(), RecursiveMode::Recursive)
        {
            crate::notifications::notify_watch_error(
                &self.vault.root().display().to_string(),
                &e.to_string(),
            );
            return Err(e.into());
        }
        info!("Watching: {}", self.vault.root().display());
        Ok(())
    }

    /// Stop watching the vault
    pub fn unwatch(&mut self) -> Result<()> {
        self.watcher.unwatch(self.vault.root())?;
        info!("Stopped watching: {}", self.vault.root().display());
        Ok(())
    }

    /// Collect pending events (non-blocking)
    pub fn poll(&self) -> Result<Vec<notify::Event>> {
        let mut events = Vec::new();

        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(e) => error!("Watch error: {}", e),
            }
        }

        Ok(events)
    }

    /// Record already-polled events and route every note that has gone quiet.
    ///
    /// A note is routed once per burst, with the trigger of its last event.
    pub fn process_polled_events(&mut self, events: Vec<notify::Event>) -> Result<usize> {
        for event in events {
            debug!("Event: {:?}", event.kind);

            for (path, trigger) in triggers_for(&self.vault, &event) {
                if let Trigger::Renamed { old_path } = &trigger {
                    self.event_handler.forget(old_path);
                }
                if !self.event_handler.record(&path, trigger) {
                    debug!("Ignoring echo of our own move: {}", path);
                }
            }
        }

        let mut moved = 0;
        for (path, trigger) in self.event_handler.take_due() {
            match self.router.route_path(&self.vault, &path, &trigger) {
                Ok(RouteOutcome::Moved { to, .. }) => {
                    moved += 1;
                    self.event_handler.suppress(&to);
                }
                Ok(outcome) => debug!("{}: {:?}", path, outcome),
                Err(e) => {
                    // Skip NotFound errors (file gone between event and processing)
                    if e.downcast_ref::<std::io::Error>().is_some_and(|io_err| {
                        io_err.kind() == std::io::ErrorKind::NotFound
                    }) {
                        debug!("File disappeared before processing: {}", path);
                        continue;
                    }
                    error!("Routing failed for {}: {:#}", path, e);
                }
            }
        }

        self.event_handler.cleanup();

        self.files_moved.fetch_add(moved as u64, Ordering::Relaxed);
        Ok(moved)
    }

    /// Poll and process in one step
    pub fn process_events(&mut self) -> Result<usize> {
        let events = self.poll()?;
        self.process_polled_events(events)
    }

    /// Get total number of notes moved
    pub fn files_moved(&self) -> u64 {
        self.files_moved.load(Ordering::Relaxed)
    }
}

/// Map one notification to the vault files it concerns and why.
///
/// Hidden paths, paths outside the vault and paths that are no longer files
/// are dropped.
pub fn triggers_for(vault: &Vault, event: &notify::Event) -> Vec<(String, Trigger)> {
    let relative = |p: &std::path::PathBuf| {
        vault
            .relative(p)
            .filter(|r| !Vault::is_ignored(r) && p.is_file())
    };

    let mut result = Vec::new();
    match event.kind {
        EventKind::Create(_) => {
            result.extend(
                event
                    .paths
                    .iter()
                    .filter_map(relative)
                    .map(|p| (p, Trigger::Created)),
            );
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to] = event.paths.as_slice()
                && let Some(to) = relative(to)
            {
                let old_path = vault
                    .relative(from)
                    .unwrap_or_else(|| from.to_string_lossy().into_owned());
                result.push((to, Trigger::Renamed { old_path }));
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            // Paired with a later `To`/`Both` event
        }
        EventKind::Modify(_) => {
            result.extend(
                event
                    .paths
                    .iter()
                    .filter_map(relative)
                    .map(|p| (p, Trigger::Modified)),
            );
        }
        _ => {
            debug!("Ignoring event kind: {:?}", event.kind);
        }
    }
    result
}
