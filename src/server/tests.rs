//! Tests for the push-channel server

use super::*;
use base64::Engine as _;
use serde_json::json;

use crate::core::config::ClusteringConfig;
use crate::embedding::HashingEmbedder;
use crate::engine::{spawn, Analyzer};
use crate::extract::ExtractorService;
use std::sync::Arc;
use tempfile::TempDir;

fn test_context(root: &std::path::Path) -> ServerContext {
    let analyzer = Analyzer::new(
        Arc::new(HashingEmbedder::new(16)),
        ClusteringConfig::default(),
    );
    let extractor = Arc::new(ExtractorService::new());
    let (engine, snapshots) = spawn(analyzer, extractor, root.to_path_buf());
    ServerContext { engine, snapshots }
}

#[tokio::test]
async fn router_builds_with_all_routes() {
    let root = TempDir::new().unwrap();
    let context = test_context(root.path());
    let _router = router(context);
}

#[test]
fn analyze_request_accepts_wire_names() {
    let request: AnalyzeRequest = serde_json::from_str(r#"{"algorithm":"KMEANS"}"#).unwrap();
    assert_eq!(request.algorithm, "KMEANS");
    assert_eq!(
        request.algorithm.parse::<Algorithm>().unwrap(),
        Algorithm::CentroidK
    );

    let request: AnalyzeRequest = serde_json::from_str(r#"{"algorithm":"DBSCAN"}"#).unwrap();
    assert_eq!(
        request.algorithm.parse::<Algorithm>().unwrap(),
        Algorithm::ThresholdLinkage
    );
}

#[test]
fn upload_request_shape() {
    let request: UploadRequest =
        serde_json::from_str(r#"{"name":"notes.txt","data_base64":"aGVsbG8="}"#).unwrap();
    assert_eq!(request.name, "notes.txt");
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&request.data_base64)
        .unwrap();
    assert_eq!(decoded, b"hello");
}

#[test]
fn delete_request_shape() {
    let request: DeleteRequest =
        serde_json::from_str(r#"{"path":"/watched/Topic/a.txt"}"#).unwrap();
    assert_eq!(request.path, PathBuf::from("/watched/Topic/a.txt"));
}

#[test]
fn update_envelope_wraps_the_snapshot() {
    let snapshot = Snapshot::default();
    let payload = json!({ "type": "update", "data": snapshot });
    assert_eq!(payload["type"], "update");
    assert!(payload["data"].get("clusters").is_some());
    assert!(payload["data"].get("files").is_some());
    assert!(payload["data"].get("pipeline").is_some());
    assert!(payload["data"].get("algorithm").is_some());
}
