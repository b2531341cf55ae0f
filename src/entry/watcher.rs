//! Route manifest watcher for development reloads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::manifest::{load_entrypoint, ManifestEntry};

/// A watcher that monitors the route manifest for changes.
pub struct EntryWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ManifestEntry>,
}

impl EntryWatcher {
    /// Create a new EntryWatcher.
    ///
    /// Returns the watcher and a receiver for freshly loaded manifests.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ManifestEntry>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = %path.display(), "Route manifest changed, reloading");
                        match load_entrypoint(&path) {
                            Ok(entry) => {
                                let _ = tx.send(entry);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload routes, keeping current table");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Route manifest watcher started");
        Ok(watcher)
    }
}
