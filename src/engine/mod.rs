//! Engine owner
//!
//! [`Analyzer`] holds all mutable clustering state: the embedding
//! store, the current labels and the label→name lookup. It is an
//! explicitly owned instance, never an ambient singleton, and every
//! mutation flows through one worker task fed by an [`EngineCommand`]
//! queue, so no two organize calls ever run concurrently against the
//! same store. Read-side consumers receive state through a watch
//! channel of [`Snapshot`]s, rebuilt from the physical tree after
//! every command so pushed state always matches disk.

pub mod snapshot;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::ArrayView1;
use tokio::sync::{mpsc, watch};

use crate::cluster::{self, namer, Algorithm};
use crate::core::config::ClusteringConfig;
use crate::core::error::{OrganizerError, Result};
use crate::embedding::TextEmbedder;
use crate::extract::ExtractorService;
use crate::organizer::{self, Placement};
use crate::reconcile::{self, Partition, UNSORTED_LABEL, UNSORTED_NAME};
use crate::store::EmbeddingStore;

pub use snapshot::{build_snapshot, FileNode, Snapshot, StageStatus};

/// Confidence reported for files the store has no embedding for
const DEFAULT_CONFIDENCE: f32 = 0.85;

/// Command queue depth between producers and the engine owner
const COMMAND_BUFFER: usize = 256;

/// Clustering state with the store it derives from.
///
/// Labels and names are a cache: reclustering replaces them from the
/// store, and a disk sync replaces them wholesale from the folder
/// tree. Only the `{embeddings, contents}` pair persists; the
/// partition is always rederived.
pub struct Analyzer {
    store: EmbeddingStore,
    labels: HashMap<PathBuf, i32>,
    names: HashMap<i32, String>,
    clustering: ClusteringConfig,
    last_algorithm: Algorithm,
    state_file: Option<PathBuf>,
}

impl Analyzer {
    pub fn new(embedder: Arc<dyn TextEmbedder>, clustering: ClusteringConfig) -> Self {
        Self {
            store: EmbeddingStore::new(embedder),
            labels: HashMap::new(),
            names: HashMap::new(),
            clustering,
            last_algorithm: Algorithm::default(),
            state_file: None,
        }
    }

    /// Attach a state file, load whatever it holds and recluster to
    /// restore the partition. A missing or corrupt file starts empty.
    pub fn with_state_file(mut self, path: PathBuf) -> Self {
        self.store.load(&path);
        self.state_file = Some(path);
        if !self.store.is_empty() {
            self.recluster(Algorithm::default());
        }
        self
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    pub fn labels(&self) -> &HashMap<PathBuf, i32> {
        &self.labels
    }

    pub fn cluster_names(&self) -> &HashMap<i32, String> {
        &self.names
    }

    pub fn algorithm(&self) -> Algorithm {
        self.last_algorithm
    }

    /// Record (or re-record) a file and recluster eagerly
    pub fn update_file(&mut self, path: &Path, text: &str) {
        self.store.upsert(path, text);
        self.recluster(Algorithm::default());
    }

    /// Forget a file and recluster eagerly
    pub fn remove_file(&mut self, path: &Path) {
        self.store.remove(path);
        self.recluster(Algorithm::default());
    }

    /// Re-key a record after its file moved on disk. The grouping is
    /// unchanged, so no recluster happens, only the keys move.
    pub fn rename_file(&mut self, from: &Path, to: &Path) {
        self.store.rename(from, to);
        if let Some(label) = self.labels.remove(from) {
            self.labels.insert(to.to_path_buf(), label);
        }
    }

    /// Recompute the whole partition from the store and regenerate
    /// cluster names for the new membership
    pub fn recluster(&mut self, algorithm: Algorithm) {
        self.labels = cluster::recompute(self.store.embeddings(), algorithm, &self.clustering);
        self.last_algorithm = algorithm;
        self.generate_names();
        self.save_state();
    }

    fn generate_names(&mut self) {
        let mut members: HashMap<i32, Vec<&str>> = HashMap::new();
        for (path, label) in &self.labels {
            if *label == UNSORTED_LABEL {
                continue;
            }
            let texts = members.entry(*label).or_default();
            if let Some(text) = self.store.content_of(path) {
                texts.push(text);
            }
        }

        // Names must be unique within one partition: two topics with
        // the same salient terms would otherwise collapse into one
        // folder. Label order keeps the disambiguation deterministic.
        let mut labels: Vec<i32> = members.keys().copied().collect();
        labels.sort_unstable();

        let mut names = HashMap::new();
        let mut used = HashSet::new();
        for label in labels {
            let mut name = namer::name(label, &members[&label]);
            if !used.insert(name.clone()) {
                name = format!("{name}_{label}");
                used.insert(name.clone());
            }
            names.insert(label, name);
        }
        self.names = names;
    }

    pub fn label_of(&self, path: &Path) -> i32 {
        self.labels.get(path).copied().unwrap_or(UNSORTED_LABEL)
    }

    pub fn name_of(&self, label: i32) -> String {
        if label == UNSORTED_LABEL {
            return UNSORTED_NAME.to_string();
        }
        self.names
            .get(&label)
            .cloned()
            .unwrap_or_else(|| format!("Topic_{label}"))
    }

    /// Replace the visible partition with one observed on disk
    pub fn apply_partition(&mut self, partition: Partition) {
        self.labels = partition.labels;
        self.names = partition.names;
    }

    /// Drop all state: store records, partition, and the persisted
    /// state file if one is attached
    pub fn clear(&mut self) {
        self.store.clear();
        self.labels.clear();
        self.names.clear();
        if let Some(ref path) = self.state_file {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove state file");
                }
            }
        }
        tracing::info!("engine state cleared");
    }

    fn save_state(&self) {
        if let Some(ref path) = self.state_file {
            if let Err(e) = self.store.save(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to persist state");
            }
        }
    }

    /// Cosine-to-centroid confidence in [0, 1] for a file, or the
    /// default when no embedding is known
    pub fn confidence(&self, path: &Path) -> f32 {
        let Some(embedding) = self.store.embedding_of(path) else {
            return DEFAULT_CONFIDENCE;
        };
        let label = self.label_of(path);

        let member_vectors: Vec<&[f32]> = self
            .labels
            .iter()
            .filter(|(_, l)| **l == label)
            .filter_map(|(p, _)| self.store.embedding_of(p))
            .collect();
        let Some(centroid) = cluster::centroid_of(&member_vectors) else {
            return DEFAULT_CONFIDENCE;
        };

        let similarity =
            cluster::cosine_similarity(ArrayView1::from(embedding), centroid.view());
        (0.5 + 0.5 * similarity).clamp(0.0, 1.0)
    }
}

/// File lifecycle events the watcher reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Moved,
}

/// Commands accepted by the engine owner
#[derive(Debug)]
pub enum EngineCommand {
    /// One observed file event; triggers exactly one organize call
    FileEvent { path: PathBuf, kind: FileEventKind },
    /// Manual full reclustering plus re-placement of all known files
    Analyze { algorithm: Algorithm },
    /// Write a new file into the root and organize it
    Upload { name: String, data: Vec<u8> },
    /// Delete a file and purge it from the store
    Delete { path: PathBuf },
    /// Flatten every cluster back to root and clear all engine state
    Declutter,
}

/// Cheap cloneable handle for posting commands to the engine owner
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|e| OrganizerError::Engine(format!("engine queue closed: {e}")))
    }
}

/// Spawn the engine owner task.
///
/// Returns the command handle and the snapshot channel. The worker
/// reconciles against disk and publishes a fresh snapshot after every
/// command, and once at startup.
pub fn spawn(
    mut analyzer: Analyzer,
    extractor: Arc<ExtractorService>,
    root: PathBuf,
) -> (EngineHandle, watch::Receiver<Snapshot>) {
    let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

    tokio::spawn(async move {
        refresh(&mut analyzer, &root, &snapshot_tx).await;
        while let Some(command) = rx.recv().await {
            handle_command(&mut analyzer, &extractor, &root, command).await;
            refresh(&mut analyzer, &root, &snapshot_tx).await;
        }
        tracing::info!("engine owner shutting down");
    });

    (EngineHandle { tx }, snapshot_rx)
}

/// Reconcile the partition with disk and publish a snapshot
async fn refresh(analyzer: &mut Analyzer, root: &Path, snapshot_tx: &watch::Sender<Snapshot>) {
    match reconcile::sync(root).await {
        Ok(partition) => analyzer.apply_partition(partition),
        Err(e) => tracing::warn!(error = %e, "disk reconciliation failed"),
    }
    let snapshot = build_snapshot(analyzer).await;
    let _ = snapshot_tx.send(snapshot);
}

async fn handle_command(
    analyzer: &mut Analyzer,
    extractor: &ExtractorService,
    root: &Path,
    command: EngineCommand,
) {
    match command {
        EngineCommand::FileEvent { path, kind } => {
            tracing::debug!(path = %path.display(), ?kind, "handling file event");
            match organizer::organize(analyzer, extractor, &path, root).await {
                Ok(placement) => log_placement(&path, &placement),
                Err(e) => {
                    // Never fatal: the file stays put and the next
                    // reconcile pass absorbs any staleness
                    tracing::warn!(path = %path.display(), error = %e, "organize failed, skipping file");
                }
            }
        }

        EngineCommand::Analyze { algorithm } => {
            tracing::info!(algorithm = algorithm.wire_name(), "manual re-analysis");
            analyzer.recluster(algorithm);

            let known: Vec<PathBuf> = analyzer.store().embeddings().keys().cloned().collect();
            for path in known {
                match organizer::place(analyzer, &path, root).await {
                    Ok(placement) => log_placement(&path, &placement),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "re-placement failed, skipping file");
                    }
                }
            }

            let state_file = analyzer.state_file.clone();
            let exclude: Vec<&Path> = state_file.iter().map(PathBuf::as_path).collect();
            if let Err(e) = organizer::sweep_duplicates(root, &exclude).await {
                tracing::warn!(error = %e, "duplicate sweep failed");
            }
            if let Err(e) = organizer::clean_empty_dirs(root).await {
                tracing::warn!(error = %e, "empty directory cleanup failed");
            }
        }

        EngineCommand::Upload { name, data } => {
            // Only the final component is honored, so an upload can
            // never escape the watched root
            let Some(file_name) = Path::new(&name).file_name().map(|n| n.to_os_string()) else {
                tracing::warn!(%name, "upload with unusable file name rejected");
                return;
            };
            let dest = root.join(file_name);
            if let Err(e) = tokio::fs::write(&dest, &data).await {
                tracing::warn!(path = %dest.display(), error = %e, "upload write failed");
                return;
            }
            tracing::info!(path = %dest.display(), bytes = data.len(), "file uploaded");
            match organizer::organize(analyzer, extractor, &dest, root).await {
                Ok(placement) => log_placement(&dest, &placement),
                Err(e) => {
                    tracing::warn!(path = %dest.display(), error = %e, "organize failed for upload");
                }
            }
        }

        EngineCommand::Delete { path } => {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "delete failed");
                }
            }
            analyzer.remove_file(&path);
            tracing::info!(path = %path.display(), "file deleted and purged from store");
        }

        EngineCommand::Declutter => {
            match organizer::declutter(root).await {
                Ok(moved) => tracing::info!(moved, "decluttered back to root"),
                Err(e) => tracing::warn!(error = %e, "declutter failed"),
            }
            analyzer.clear();
        }
    }
}

fn log_placement(path: &Path, placement: &Placement) {
    match placement {
        Placement::Moved { to, .. } => {
            tracing::info!(from = %path.display(), to = %to.display(), "placed");
        }
        Placement::DuplicateRemoved { existing } => {
            tracing::info!(path = %path.display(), existing = %existing.display(), "duplicate suppressed");
        }
        Placement::AlreadyPlaced => {
            tracing::debug!(path = %path.display(), "already placed");
        }
        Placement::SkippedDirectory | Placement::SkippedNoText | Placement::SkippedUnsorted => {
            tracing::debug!(path = %path.display(), ?placement, "skipped");
        }
    }
}
