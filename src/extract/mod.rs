//! Content extraction module
//!
//! Turns files on disk into plain text for the clustering engine.
//! Format-specific extractors implement the [`ContentExtractor`]
//! trait; [`ExtractorService`] dispatches on extension. Unsupported
//! formats extract to empty text, which the placement path treats as
//! a recoverable skip rather than an error.

mod pdf;
mod text;

#[cfg(test)]
mod tests;

pub use pdf::PdfExtractor;
pub use text::TextExtractor;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during content extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    #[error("Encoding error: {reason}")]
    EncodingError { reason: String },
}

/// Trait for format-specific text extractors
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Extract the plain text of the file at `path`
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;

    /// Get supported file extensions (lowercase, without the dot)
    fn supported_extensions(&self) -> &[&str];
}

/// Main extraction service that delegates to format-specific extractors
pub struct ExtractorService {
    text_extractor: TextExtractor,
    pdf_extractor: PdfExtractor,
}

impl ExtractorService {
    pub fn new() -> Self {
        Self {
            text_extractor: TextExtractor::new(),
            pdf_extractor: PdfExtractor::new(),
        }
    }

    /// Extract text from a file based on its extension.
    ///
    /// Unsupported extensions yield `Ok("")` so the caller can treat
    /// the file as a no-text skip without special-casing the format.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extension = extension_of(path);

        let extractor: &dyn ContentExtractor = if self
            .text_extractor
            .supported_extensions()
            .contains(&extension.as_str())
        {
            &self.text_extractor
        } else if self
            .pdf_extractor
            .supported_extensions()
            .contains(&extension.as_str())
        {
            &self.pdf_extractor
        } else {
            return Ok(String::new());
        };

        extractor.extract(path).await
    }

    /// Check whether a file's extension has a dedicated extractor
    pub fn is_supported(&self, path: &Path) -> bool {
        let extension = extension_of(path);
        self.text_extractor
            .supported_extensions()
            .contains(&extension.as_str())
            || self
                .pdf_extractor
                .supported_extensions()
                .contains(&extension.as_str())
    }
}

impl Default for ExtractorService {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased extension of a path, empty string if none
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
