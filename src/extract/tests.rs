//! Tests for the content extraction module

use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

async fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, bytes).await.unwrap();
    path
}

#[tokio::test]
async fn extracts_utf8_text_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "notes.txt", "neural networks lecture".as_bytes()).await;

    let service = ExtractorService::new();
    let text = service.extract(&path).await.unwrap();
    assert_eq!(text, "neural networks lecture");
}

#[tokio::test]
async fn extracts_markdown() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "readme.md", b"# Heading\n\nbody text").await;

    let service = ExtractorService::new();
    let text = service.extract(&path).await.unwrap();
    assert!(text.contains("body text"));
}

#[tokio::test]
async fn unsupported_extension_extracts_to_empty() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "image.png", &[0x89, 0x50, 0x4E, 0x47]).await;

    let service = ExtractorService::new();
    let text = service.extract(&path).await.unwrap();
    assert!(text.is_empty());
    assert!(!service.is_supported(&path));
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let service = ExtractorService::new();
    let result = service.extract(Path::new("/no/such/file.txt")).await;
    assert!(matches!(result, Err(ExtractError::FileNotFound { .. })));
}

#[tokio::test]
async fn latin1_bytes_still_decode() {
    let dir = TempDir::new().unwrap();
    // 0xE9 is 'é' in Latin-1 and invalid as a standalone UTF-8 byte
    let path = write_file(&dir, "latin.txt", &[b'c', b'a', b'f', 0xE9]).await;

    let service = ExtractorService::new();
    let text = service.extract(&path).await.unwrap();
    assert_eq!(text, "café");
}

#[tokio::test]
async fn utf16_with_bom_decodes() {
    let dir = TempDir::new().unwrap();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "hi".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let path = write_file(&dir, "wide.txt", &bytes).await;

    let service = ExtractorService::new();
    let text = service.extract(&path).await.unwrap();
    assert_eq!(text, "hi");
}

#[test]
fn extension_dispatch_is_case_insensitive() {
    let service = ExtractorService::new();
    assert!(service.is_supported(Path::new("REPORT.TXT")));
    assert!(service.is_supported(Path::new("paper.PDF")));
    assert!(!service.is_supported(Path::new("archive.zip")));
}
