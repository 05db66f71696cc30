//! State snapshot pushed to listeners
//!
//! The wire shape of engine state: the cluster map, per-file detail
//! nodes, pipeline stage statuses and the algorithm last used.
//! Snapshots are built from the reconciled partition, so they always
//! reflect the physical tree at the time of the push.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Analyzer;
use crate::cluster::namer;
use crate::reconcile::UNSORTED_LABEL;

/// Characters of content included as a preview
const PREVIEW_CHARS: usize = 200;

/// How many salient words each file node carries
const KEYWORD_COUNT: usize = 3;

/// Minimum length for a salient word
const KEYWORD_MIN_LEN: usize = 5;

/// Keywords used when a file has no usable content
const FALLBACK_KEYWORDS: [&str; 3] = ["document", "file", "data"];

/// Pipeline stages reported to clients, in order
const PIPELINE_STAGES: [(&str, &str); 5] = [
    ("monitor", "Folder Monitor"),
    ("extract", "Text Extraction"),
    ("embed", "Embedding"),
    ("cluster", "Clustering"),
    ("organize", "Placement"),
];

/// Complete engine state as pushed over the wire
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Current label → folder name map
    pub clusters: BTreeMap<i32, String>,
    /// One node per known file
    pub files: Vec<FileNode>,
    /// Pipeline stage statuses
    pub pipeline: Vec<StageStatus>,
    /// Wire name of the algorithm behind the current partition
    pub algorithm: String,
}

/// Per-file detail for the cluster map view
#[derive(Debug, Clone, Serialize)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub cluster: i32,
    pub cluster_name: String,
    pub preview: String,
    pub size: String,
    pub modified: i64,
    pub extension: String,
    pub keywords: Vec<String>,
    pub confidence: f32,
}

/// One pipeline stage and its status (`idle`, `active` or `done`)
#[derive(Debug, Clone, Serialize)]
pub struct StageStatus {
    pub id: String,
    pub label: String,
    pub status: String,
}

/// Build a snapshot from the analyzer's current (already reconciled)
/// partition and the files' on-disk metadata.
pub async fn build_snapshot(analyzer: &Analyzer) -> Snapshot {
    let mut entries: Vec<(&PathBuf, i32)> =
        analyzer.labels().iter().map(|(p, l)| (p, *l)).collect();
    entries.sort();

    let mut files = Vec::with_capacity(entries.len());
    for (path, label) in entries {
        // A file can vanish between reconcile and here; just drop it,
        // the next push self-corrects
        let Ok(metadata) = tokio::fs::metadata(path).await else {
            continue;
        };

        let content = analyzer.store().content_of(path);
        let mut keywords = content
            .map(|text| namer::salient_words(text, KEYWORD_COUNT, KEYWORD_MIN_LEN))
            .unwrap_or_default();
        if keywords.is_empty() {
            keywords = FALLBACK_KEYWORDS.iter().map(|k| k.to_string()).collect();
        }

        let modified = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp())
            .unwrap_or(0);

        files.push(FileNode {
            path: path.display().to_string(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            cluster: label,
            cluster_name: analyzer.name_of(label),
            preview: content
                .map(|text| text.chars().take(PREVIEW_CHARS).collect())
                .unwrap_or_default(),
            size: format_size(metadata.len()),
            modified,
            extension: extension_tag(path),
            keywords,
            confidence: analyzer.confidence(path),
        });
    }

    let clusters: BTreeMap<i32, String> = analyzer
        .cluster_names()
        .iter()
        .filter(|(label, _)| **label != UNSORTED_LABEL)
        .map(|(label, name)| (*label, name.clone()))
        .collect();

    let status = if files.is_empty() { "idle" } else { "done" };
    let pipeline = PIPELINE_STAGES
        .iter()
        .map(|(id, label)| StageStatus {
            id: id.to_string(),
            label: label.to_string(),
            status: status.to_string(),
        })
        .collect();

    Snapshot {
        clusters,
        files,
        pipeline,
        algorithm: analyzer.algorithm().wire_name().to_string(),
    }
}

/// Human-readable size in KB or MB
fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{:.1} KB", bytes / 1024.0)
    }
}

/// Uppercase extension, or UNKNOWN when the file has none
fn extension_tag(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}
