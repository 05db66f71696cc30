//! Error types for TopicFS
//!
//! Per-module error enums live next to the code that raises them; this
//! module provides the crate-level umbrella and the `Result` alias.
//! Nothing in the organizing core is fatal to the process: placement
//! failures are logged and skipped, a corrupt state file yields an
//! empty engine, and naming failures fall back to placeholder names.

use thiserror::Error;

use crate::extract::ExtractError;
use crate::organizer::OrganizeError;
use crate::store::StoreError;

/// Result type alias for TopicFS operations
pub type Result<T> = std::result::Result<T, OrganizerError>;

/// Main error type for TopicFS
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Placement error: {0}")]
    Organize(#[from] OrganizeError),

    #[error("Watcher error: {0}")]
    Watcher(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Engine unavailable: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
