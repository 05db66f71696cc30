//! Folder watcher
//!
//! Watches the organized root with notify and forwards file
//! lifecycle events (`created`, `modified`, `moved`) to the engine
//! owner. Directory events are dropped, created files get a settle
//! delay before processing so a still-being-written file is not read
//! mid-write, and an optional strict mode restricts processing to
//! events whose parent is the root itself.
//!
//! Event forwarding is strictly serialized: one task drains the raw
//! notify stream and posts commands onto the engine queue in order.
//! The engine's idempotence guard makes the watcher safe against the
//! moves it indirectly causes.


use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::error::{OrganizerError, Result};
use crate::engine::{EngineCommand, EngineHandle, FileEventKind};

/// Configuration for the folder watcher
#[derive(Debug, Clone)]
pub struct FolderWatcherConfig {
    /// Pause after a creation event before the file is organized
    pub settle_delay: Duration,
    /// Strict mode: only process events whose parent directory is the
    /// watched root (the alternate behavior; off by default)
    pub root_only_events: bool,
    /// Channel buffer size for raw events
    pub channel_buffer_size: usize,
}

impl Default for FolderWatcherConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            root_only_events: false,
            channel_buffer_size: 1024,
        }
    }
}

/// Watches the root and feeds the engine's command queue
pub struct FolderWatcher {
    root: PathBuf,
    config: FolderWatcherConfig,
    _watcher: Option<RecommendedWatcher>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl FolderWatcher {
    pub fn new(root: PathBuf, config: FolderWatcherConfig) -> Self {
        Self {
            root,
            config,
            _watcher: None,
            shutdown_tx: None,
        }
    }

    /// Start watching. Raw notify events are bridged onto a tokio
    /// channel and drained by a single forwarding task that posts
    /// engine commands in arrival order.
    pub fn start(&mut self, engine: EngineHandle) -> Result<()> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<Event>(self.config.channel_buffer_size);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let mut watcher =
            notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = raw_tx.blocking_send(event);
                }
            })
            .map_err(|e| OrganizerError::Watcher(e.to_string()))?;

        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| {
                OrganizerError::Watcher(format!("failed to watch {:?}: {e}", self.root))
            })?;
        self._watcher = Some(watcher);

        let root = self.root.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    event = raw_rx.recv() => {
                        let Some(event) = event else { break };
                        forward_event(event, &root, &config, &engine).await;
                    }
                }
            }
            tracing::info!("watcher forwarding task stopped");
        });

        tracing::info!(root = %self.root.display(), "watching folder");
        Ok(())
    }

    /// Stop watching and end the forwarding task
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        self._watcher = None;
    }
}

/// Convert one raw notify event and post it to the engine
async fn forward_event(
    event: Event,
    root: &Path,
    config: &FolderWatcherConfig,
    engine: &EngineHandle,
) {
    let Some((kind, path)) = classify(&event) else {
        return;
    };

    if !should_process(&path, root, config.root_only_events) {
        return;
    }

    // Directories are never organized; a vanished path will be
    // reported by the organize call itself
    if path.is_dir() {
        return;
    }

    let event_id = Uuid::now_v7();
    tracing::debug!(%event_id, ?kind, path = %path.display(), "file event");

    if kind == FileEventKind::Created {
        // Settle delay absorbs partial-write races. Sleeping here
        // keeps event forwarding serial, like the rest of the
        // ingestion path.
        tokio::time::sleep(config.settle_delay).await;
    }

    if engine
        .send(EngineCommand::FileEvent { path, kind })
        .await
        .is_err()
    {
        tracing::warn!(%event_id, "engine queue closed, dropping event");
    }
}

/// Map a notify event to our lifecycle kinds. Deletions and
/// rename-from halves carry no work: removed files drop out at the
/// next reconcile, and a rename surfaces again as its `To` half.
fn classify(event: &Event) -> Option<(FileEventKind, PathBuf)> {
    match &event.kind {
        EventKind::Create(_) => Some((FileEventKind::Created, event.paths.first()?.clone())),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::To | RenameMode::Both => {
                Some((FileEventKind::Moved, event.paths.last()?.clone()))
            }
            _ => None,
        },
        EventKind::Modify(_) => Some((FileEventKind::Modified, event.paths.first()?.clone())),
        _ => None,
    }
}

/// Event filter: in strict mode only direct children of the root are
/// processed; otherwise every path is
fn should_process(path: &Path, root: &Path, root_only: bool) -> bool {
    if !root_only {
        return true;
    }
    path.parent().map(|parent| parent == root).unwrap_or(false)
}
