//! Disk reconciliation
//!
//! Rebuilds the externally visible partition from the literal folder
//! structure under the watched root, so reported state always matches
//! the physical tree even when files were moved by this engine or by
//! an external actor. Disk is the source of truth for where a file
//! currently *is*; the clustering engine remains the source of truth
//! for where it should go next. A sync never touches the embedding
//! store: it is a presentation-layer truth pass, not a retraining
//! pass.


use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Label for files directly under the watched root
pub const UNSORTED_LABEL: i32 = -1;

/// Display name for the unsorted pseudo-cluster
pub const UNSORTED_NAME: &str = "Unsorted";

/// Complete assignment of known files to labels, plus the label→name
/// lookup. Labels are small integers valid for this partition only.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub labels: HashMap<PathBuf, i32>,
    pub names: HashMap<i32, String>,
}

impl Partition {
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
}

/// Scan exactly one level below `root` and derive the partition from
/// what is physically there.
///
/// Each direct subdirectory becomes a cluster whose label is its
/// position in name-sorted order (stable within one sync call, not
/// across calls) and whose name is the directory's literal name.
/// Every file directly inside such a subdirectory carries that label;
/// every file directly under `root` is labeled `-1`. Deeper nesting
/// and non-file/non-directory entries are ignored.
pub async fn sync(root: &Path) -> io::Result<Partition> {
    let mut partition = Partition::default();
    if !root.exists() {
        return Ok(partition);
    }

    let mut subdirs: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let file_type = match entry.file_type().await {
            Ok(ft) => ft,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() {
            partition.labels.insert(path, UNSORTED_LABEL);
        }
    }

    // Name-sorted order keeps label assignment stable within a sync
    subdirs.sort();

    for (index, dir) in subdirs.iter().enumerate() {
        let label = index as i32;
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("Topic_{label}"));
        partition.names.insert(label, name);

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => {
                    partition.labels.insert(path, label);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                }
            }
        }
    }

    tracing::debug!(
        files = partition.labels.len(),
        folders = partition.names.len(),
        "partition synced from disk"
    );
    Ok(partition)
}
