//! Placement orchestrator
//!
//! Owns the physical side of organization: given a file event, runs
//! extraction and clustering through the analyzer, computes the
//! target cluster directory and performs a safe move: suppressing
//! content duplicates, resolving filename collisions and skipping
//! files that are already where they belong, so a move's own
//! filesystem event can never re-trigger another move.
//!
//! Also carries the housekeeping passes: empty-directory cleanup
//! after bulk reorganization, the declutter flatten-back-to-root
//! operation and the whole-tree duplicate sweep.


use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::engine::Analyzer;
use crate::extract::{ExtractError, ExtractorService};
use crate::reconcile::UNSORTED_LABEL;

/// Errors raised while placing a file
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Invalid file name: {path}")]
    InvalidFileName { path: String },
}

/// Outcome of one placement attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Directories are never organized
    SkippedDirectory,
    /// Extraction produced no text; the file stays where it is
    SkippedNoText,
    /// The file's cluster is the unsorted root; nothing to move
    SkippedUnsorted,
    /// Identical content already lives in the target cluster; the
    /// source was deleted, never duplicated
    DuplicateRemoved { existing: PathBuf },
    /// The file is already at its computed target path
    AlreadyPlaced,
    /// The file was moved into its cluster directory
    Moved { from: PathBuf, to: PathBuf },
}

/// Organize one file event end to end: extract text, update the
/// analyzer (which reclusters eagerly), then place the file into its
/// topic directory under `root`.
pub async fn organize(
    analyzer: &mut Analyzer,
    extractor: &ExtractorService,
    path: &Path,
    root: &Path,
) -> Result<Placement, OrganizeError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.is_dir() {
        return Ok(Placement::SkippedDirectory);
    }

    let text = extractor.extract(path).await?;
    if text.trim().is_empty() {
        tracing::info!(path = %path.display(), "no text extracted, skipping");
        return Ok(Placement::SkippedNoText);
    }

    analyzer.update_file(path, &text);
    place(analyzer, path, root).await
}

/// Place a file according to the analyzer's current partition,
/// without re-extracting or reclustering. Used on its own when a
/// manual re-analysis re-runs placement for every known file.
pub async fn place(
    analyzer: &mut Analyzer,
    path: &Path,
    root: &Path,
) -> Result<Placement, OrganizeError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.is_dir() {
        return Ok(Placement::SkippedDirectory);
    }

    let label = analyzer.label_of(path);
    if label == UNSORTED_LABEL {
        return Ok(Placement::SkippedUnsorted);
    }
    let name = analyzer.name_of(label);

    let file_name = path
        .file_name()
        .ok_or_else(|| OrganizeError::InvalidFileName {
            path: path.display().to_string(),
        })?
        .to_os_string();

    let target_dir = root.join(&name);
    tokio::fs::create_dir_all(&target_dir).await?;

    // Content-duplicate check against everything already in the
    // target, regardless of filename. The file itself is skipped so a
    // repeat call on an already-placed file stays a no-op.
    let source_hash = hash_file(path).await?;
    let mut entries = tokio::fs::read_dir(&target_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let existing = entry.path();
        if existing == path {
            continue;
        }
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        match hash_file(&existing).await {
            Ok(hash) if hash == source_hash => {
                tracing::info!(
                    source = %path.display(),
                    existing = %existing.display(),
                    "duplicate content already in cluster, removing source"
                );
                tokio::fs::remove_file(path).await?;
                analyzer.remove_file(path);
                return Ok(Placement::DuplicateRemoved { existing });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %existing.display(), error = %e, "could not hash existing file");
            }
        }
    }

    let mut target_path = target_dir.join(&file_name);
    if target_path != path && tokio::fs::try_exists(&target_path).await.unwrap_or(false) {
        let renamed = collision_name(Path::new(&file_name));
        tracing::info!(
            original = %file_name.to_string_lossy(),
            renamed = %renamed,
            "filename collision in target cluster"
        );
        target_path = target_dir.join(renamed);
    }

    // Idempotence guard: a move is itself a filesystem event, so an
    // already-placed file must not be moved onto itself.
    if target_path == path {
        return Ok(Placement::AlreadyPlaced);
    }

    tokio::fs::rename(path, &target_path).await?;
    analyzer.rename_file(path, &target_path);
    tracing::info!(
        from = %path.display(),
        to = %target_path.display(),
        cluster = %name,
        "file organized"
    );
    Ok(Placement::Moved {
        from: path.to_path_buf(),
        to: target_path,
    })
}

/// SHA-256 of a file's bytes, lowercase hex
pub async fn hash_file(path: &Path) -> Result<String, OrganizeError> {
    let bytes = tokio::fs::read(path).await?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Timestamp-suffixed variant of a colliding filename
fn collision_name(file_name: &Path) -> String {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string_lossy().into_owned());
    let timestamp = chrono::Utc::now().timestamp();
    match file_name.extension() {
        Some(ext) => format!("{stem}_{timestamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{timestamp}"),
    }
}

/// Move every file from any subfolder back to `root`, then drop the
/// emptied subfolders. Returns how many files were moved.
pub async fn declutter(root: &Path) -> Result<usize, OrganizeError> {
    let mut moved = 0;

    let mut subdirs = Vec::new();
    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            subdirs.push(entry.path());
        }
    }

    let mut stack = subdirs;
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(_) => continue,
            };
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() {
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                let mut dest = root.join(file_name);
                if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                    dest = root.join(collision_name(Path::new(file_name)));
                }
                match tokio::fs::rename(&path, &dest).await {
                    Ok(()) => moved += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "declutter move failed");
                    }
                }
            }
        }
    }

    clean_empty_dirs(root).await?;
    tracing::info!(moved, "declutter complete");
    Ok(moved)
}

/// Recursively remove directories under `root` left empty by a bulk
/// reorganization. Never removes `root` itself. Returns the number of
/// directories removed.
pub async fn clean_empty_dirs(root: &Path) -> Result<usize, OrganizeError> {
    // Collect every directory below root, then delete deepest-first;
    // remove_dir refuses non-empty directories, which is exactly the
    // guard we want.
    let mut dirs = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                dirs.push(entry.path());
                stack.push(entry.path());
            }
        }
    }

    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

    let mut removed = 0;
    for dir in dirs {
        if tokio::fs::remove_dir(&dir).await.is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Walk the whole tree under `root` and delete every file whose
/// content hash was already seen; the first occurrence wins. Hidden
/// files and any path in `exclude` are left alone. Returns the number
/// of duplicates removed.
pub async fn sweep_duplicates(root: &Path, exclude: &[&Path]) -> Result<usize, OrganizeError> {
    let mut seen: std::collections::HashMap<String, PathBuf> = std::collections::HashMap::new();
    let mut removed = 0;

    // Breadth-first with sorted entries: files directly under root
    // are seen before cluster members, so the shallow copy wins ties.
    let mut queue = std::collections::VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(_) => continue,
            };
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        subdirs.sort();

        for path in files {
            let hidden = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            if hidden || exclude.contains(&path.as_path()) {
                continue;
            }

            let hash = match hash_file(&path).await {
                Ok(hash) => hash,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not hash file");
                    continue;
                }
            };

            if let Some(original) = seen.get(&hash) {
                tracing::info!(
                    duplicate = %path.display(),
                    original = %original.display(),
                    "removing duplicate content"
                );
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            } else {
                seen.insert(hash, path);
            }
        }

        queue.extend(subdirs);
    }

    Ok(removed)
}
