//! Plain-text extractor
//!
//! Reads text-based files with a small encoding fallback chain:
//! UTF-8, then UTF-16 (either endianness via BOM), then Latin-1 as a
//! last resort since every byte sequence is valid Latin-1.

use super::{ContentExtractor, ExtractError};
use async_trait::async_trait;
use std::path::Path;

/// Extractor for text-based files (TXT, MD, CSV, ...)
pub struct TextExtractor {
    supported_extensions: Vec<&'static str>,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self {
            supported_extensions: vec![
                "txt", "md", "markdown", "rst", "json", "yaml", "yml", "toml", "xml", "csv",
                "log",
            ],
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        Ok(decode_bytes(&bytes))
    }

    fn supported_extensions(&self) -> &[&str] {
        &self.supported_extensions
    }
}

/// Decode raw bytes through the UTF-8 / UTF-16 / Latin-1 chain
fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => decode_utf16(bytes).unwrap_or_else(|| decode_latin1(bytes)),
    }
}

/// Decode UTF-16 if a byte-order mark identifies the endianness
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return None;
    }

    let (order, payload) = match (bytes[0], bytes[1]) {
        (0xFF, 0xFE) => (u16::from_le_bytes as fn([u8; 2]) -> u16, &bytes[2..]),
        (0xFE, 0xFF) => (u16::from_be_bytes as fn([u8; 2]) -> u16, &bytes[2..]),
        _ => return None,
    };

    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| order([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Latin-1 never fails: each byte maps to the same code point
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}
