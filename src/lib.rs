//! TopicFS - semantic folder organizer
//!
//! Watches a folder, derives a topic for every file dropped into it
//! from its text content, and relocates the file into a topic-named
//! subfolder while keeping a live cluster map available to clients
//! over a WebSocket push channel. This crate provides:
//! - Text extraction and the embedding gateway seam
//! - The embedding store with its persisted state pair
//! - Eager whole-set clustering (threshold-linkage and centroid-k)
//! - TF-weighted cluster naming
//! - Disk reconciliation of the visible partition
//! - Safe file placement with dedup and collision handling
//! - The single-owner engine task and its snapshot broadcast

pub mod cluster;
pub mod core;
pub mod embedding;
pub mod engine;
pub mod extract;
pub mod organizer;
pub mod reconcile;
pub mod server;
pub mod store;
pub mod watcher;

// Re-export commonly used items
pub use cluster::Algorithm;
pub use crate::core::config::AppConfig;
pub use crate::core::error::{OrganizerError, Result};
pub use embedding::{HashingEmbedder, TextEmbedder, EMBEDDING_DIM};
pub use engine::{Analyzer, EngineCommand, EngineHandle, Snapshot};
pub use extract::ExtractorService;
pub use store::EmbeddingStore;
