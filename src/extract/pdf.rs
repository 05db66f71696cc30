//! PDF extractor
//!
//! Extracts document text with the pdf-extract crate. Extraction is
//! CPU-bound, so it runs on the blocking pool.

use super::{ContentExtractor, ExtractError};
use async_trait::async_trait;
use std::path::Path;

/// Extractor for PDF documents
pub struct PdfExtractor {
    supported_extensions: Vec<&'static str>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            supported_extensions: vec!["pdf"],
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let bytes = tokio::fs::read(path).await?;

        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                ExtractError::ExtractionFailed {
                    reason: format!("PDF extraction failed: {e}"),
                }
            })
        })
        .await
        .map_err(|e| ExtractError::ExtractionFailed {
            reason: format!("extraction task aborted: {e}"),
        })?
    }

    fn supported_extensions(&self) -> &[&str] {
        &self.supported_extensions
    }
}
