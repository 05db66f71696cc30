//! Tests for the engine owner and snapshot building

use super::*;
use crate::core::config::ClusteringConfig;
use tempfile::TempDir;

/// Deterministic embedding gateway for engine-level tests
struct StubEmbedder;

impl TextEmbedder for StubEmbedder {
    fn dimension(&self) -> usize {
        4
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            vec![0.0; 4]
        } else if text.contains("neural") {
            vec![1.0, 0.0, 0.0, 0.0]
        } else if text.contains("grocery") {
            vec![0.0, 0.0, 2.0, 0.0]
        } else {
            vec![0.0, 0.0, 0.0, 2.0]
        }
    }
}

fn analyzer() -> Analyzer {
    Analyzer::new(Arc::new(StubEmbedder), ClusteringConfig::default())
}

#[test]
fn lecture_files_share_a_label_groceries_do_not() {
    let mut analyzer = analyzer();
    analyzer.update_file(Path::new("/docs/lecture1.txt"), "neural networks lecture 1");
    analyzer.update_file(Path::new("/docs/lecture2.txt"), "neural networks lecture 2");
    analyzer.update_file(Path::new("/docs/groceries.txt"), "grocery list");

    let lecture1 = analyzer.label_of(Path::new("/docs/lecture1.txt"));
    let lecture2 = analyzer.label_of(Path::new("/docs/lecture2.txt"));
    let groceries = analyzer.label_of(Path::new("/docs/groceries.txt"));

    assert_eq!(lecture1, lecture2);
    assert_ne!(lecture1, groceries);

    // Two topics, each with a generated name
    assert_eq!(analyzer.cluster_names().len(), 2);
}

#[test]
fn duplicate_names_are_disambiguated() {
    /// Two far-apart topics whose documents share their salient terms
    struct AxisEmbedder;
    impl TextEmbedder for AxisEmbedder {
        fn dimension(&self) -> usize {
            4
        }
        fn embed(&self, text: &str) -> Vec<f32> {
            if text.contains("first") {
                vec![2.0, 0.0, 0.0, 0.0]
            } else {
                vec![0.0, 0.0, 2.0, 0.0]
            }
        }
    }

    let mut analyzer = Analyzer::new(Arc::new(AxisEmbedder), ClusteringConfig::default());
    analyzer.update_file(Path::new("/docs/a.txt"), "alpha notes first");
    analyzer.update_file(Path::new("/docs/b.txt"), "alpha notes second");

    let label_a = analyzer.label_of(Path::new("/docs/a.txt"));
    let label_b = analyzer.label_of(Path::new("/docs/b.txt"));
    assert_ne!(label_a, label_b);

    let name_a = analyzer.name_of(label_a);
    let name_b = analyzer.name_of(label_b);
    assert_ne!(name_a, name_b, "names are unique per partition");
}

#[test]
fn unknown_paths_are_unsorted() {
    let analyzer = analyzer();
    assert_eq!(analyzer.label_of(Path::new("/docs/nowhere.txt")), UNSORTED_LABEL);
    assert_eq!(analyzer.name_of(UNSORTED_LABEL), UNSORTED_NAME);
}

#[test]
fn removing_a_file_reclusters() {
    let mut analyzer = analyzer();
    analyzer.update_file(Path::new("/docs/a.txt"), "neural networks");
    analyzer.update_file(Path::new("/docs/b.txt"), "grocery list");
    assert_eq!(analyzer.labels().len(), 2);

    analyzer.remove_file(Path::new("/docs/b.txt"));
    assert_eq!(analyzer.labels().len(), 1);
    // A lone survivor is its own singleton topic
    assert_eq!(analyzer.label_of(Path::new("/docs/a.txt")), 0);
}

#[test]
fn rename_preserves_label_without_reclustering() {
    let mut analyzer = analyzer();
    analyzer.update_file(Path::new("/docs/a.txt"), "neural networks");
    let label = analyzer.label_of(Path::new("/docs/a.txt"));

    analyzer.rename_file(Path::new("/docs/a.txt"), Path::new("/docs/Topic/a.txt"));
    assert_eq!(analyzer.label_of(Path::new("/docs/Topic/a.txt")), label);
    assert_eq!(analyzer.label_of(Path::new("/docs/a.txt")), UNSORTED_LABEL);
    assert!(analyzer.store().content_of(Path::new("/docs/Topic/a.txt")).is_some());
}

#[test]
fn persisted_state_round_trips_to_the_same_partition() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join("clusters.bin");

    let mut original = analyzer().with_state_file(state_file.clone());
    original.update_file(Path::new("/docs/lecture1.txt"), "neural networks lecture 1");
    original.update_file(Path::new("/docs/lecture2.txt"), "neural networks lecture 2");
    original.update_file(Path::new("/docs/groceries.txt"), "grocery list");

    // Reload from disk: the partition and names are never persisted,
    // they are rederived by reclustering the loaded pair
    let restored = analyzer().with_state_file(state_file);
    assert_eq!(restored.labels(), original.labels());
    assert_eq!(restored.cluster_names(), original.cluster_names());
}

#[test]
fn clear_removes_the_state_file() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join("clusters.bin");

    let mut analyzer = analyzer().with_state_file(state_file.clone());
    analyzer.update_file(Path::new("/docs/a.txt"), "neural networks");
    assert!(state_file.exists());

    analyzer.clear();
    assert!(!state_file.exists());
    assert!(analyzer.store().is_empty());
    assert!(analyzer.labels().is_empty());
}

#[test]
fn apply_partition_replaces_visible_state() {
    let mut analyzer = analyzer();
    analyzer.update_file(Path::new("/docs/a.txt"), "neural networks");

    let mut partition = Partition::default();
    partition.labels.insert(PathBuf::from("/docs/Topic/a.txt"), 0);
    partition.names.insert(0, "Topic".to_string());
    analyzer.apply_partition(partition);

    assert_eq!(analyzer.label_of(Path::new("/docs/Topic/a.txt")), 0);
    assert_eq!(analyzer.name_of(0), "Topic");
    // The store is untouched by a disk sync
    assert_eq!(analyzer.store().len(), 1);
}

#[test]
fn confidence_is_bounded_and_defaults_for_unknown_files() {
    let mut analyzer = analyzer();
    assert_eq!(analyzer.confidence(Path::new("/docs/unknown.txt")), 0.85);

    analyzer.update_file(Path::new("/docs/a.txt"), "neural networks");
    analyzer.update_file(Path::new("/docs/b.txt"), "neural models");
    let confidence = analyzer.confidence(Path::new("/docs/a.txt"));
    assert!((0.0..=1.0).contains(&confidence));
    // Identical members sit exactly on their centroid
    assert!((confidence - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn snapshot_reflects_disk_and_store() {
    let root = TempDir::new().unwrap();
    let cluster_dir = root.path().join("Research");
    tokio::fs::create_dir(&cluster_dir).await.unwrap();
    let organized = cluster_dir.join("paper.txt");
    tokio::fs::write(&organized, "neural networks everywhere")
        .await
        .unwrap();
    let loose = root.path().join("stray.dat");
    tokio::fs::write(&loose, b"binary").await.unwrap();

    let mut analyzer = analyzer();
    analyzer.update_file(&organized, "neural networks everywhere");
    let partition = crate::reconcile::sync(root.path()).await.unwrap();
    analyzer.apply_partition(partition);

    let snapshot = build_snapshot(&analyzer).await;
    assert_eq!(snapshot.files.len(), 2);
    assert_eq!(snapshot.algorithm, "DBSCAN");
    assert_eq!(snapshot.pipeline.len(), 5);
    assert!(snapshot.pipeline.iter().all(|s| s.status == "done"));
    assert_eq!(snapshot.clusters.len(), 1);
    assert_eq!(snapshot.clusters[&0], "Research");

    let paper = snapshot
        .files
        .iter()
        .find(|f| f.name == "paper.txt")
        .unwrap();
    assert_eq!(paper.cluster, 0);
    assert_eq!(paper.cluster_name, "Research");
    assert_eq!(paper.extension, "TXT");
    assert!(paper.preview.starts_with("neural networks"));
    assert!(paper.size.ends_with(" KB"));
    assert!(paper.modified > 0);
    assert!(paper.keywords.contains(&"neural".to_string()));

    let stray = snapshot.files.iter().find(|f| f.name == "stray.dat").unwrap();
    assert_eq!(stray.cluster, UNSORTED_LABEL);
    assert_eq!(stray.cluster_name, UNSORTED_NAME);
    assert_eq!(stray.extension, "DAT");
    // No stored content: fallback keywords and default confidence
    assert_eq!(stray.keywords, vec!["document", "file", "data"]);
    assert_eq!(stray.confidence, 0.85);
    assert!(stray.preview.is_empty());
}

#[tokio::test]
async fn preview_is_capped_at_200_chars() {
    let mut analyzer = analyzer();
    let long_text = format!("neural {}", "x".repeat(500));
    let root = TempDir::new().unwrap();
    let path = root.path().join("long.txt");
    tokio::fs::write(&path, &long_text).await.unwrap();
    analyzer.update_file(&path, &long_text);

    let snapshot = build_snapshot(&analyzer).await;
    assert_eq!(snapshot.files.len(), 1);
    assert_eq!(snapshot.files[0].preview.chars().count(), 200);
}

#[tokio::test]
async fn engine_owner_processes_commands_and_publishes() {
    let root = TempDir::new().unwrap();
    let extractor = Arc::new(ExtractorService::new());
    let (engine, mut snapshots) = spawn(analyzer(), extractor, root.path().to_path_buf());

    engine
        .send(EngineCommand::Upload {
            name: "note.txt".to_string(),
            data: b"neural networks in practice".to_vec(),
        })
        .await
        .unwrap();

    let organized = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            snapshots.changed().await.unwrap();
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.files.len() == 1 && snapshot.files[0].cluster != UNSORTED_LABEL {
                break snapshot;
            }
        }
    })
    .await
    .expect("engine should organize the upload");

    let node = &organized.files[0];
    assert_eq!(node.name, "note.txt");
    assert!(!organized.clusters.is_empty());

    // Delete purges the file and the next snapshot is empty
    engine
        .send(EngineCommand::Delete {
            path: PathBuf::from(&node.path),
        })
        .await
        .unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            snapshots.changed().await.unwrap();
            if snapshots.borrow_and_update().files.is_empty() {
                break;
            }
        }
    })
    .await
    .expect("engine should publish the emptied state");
}
