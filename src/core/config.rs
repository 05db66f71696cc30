//! Configuration module for TopicFS
//!
//! Handles application configuration including:
//! - The watched root directory and persisted state location
//! - Server settings for the push channel
//! - Watcher behavior (settle delay, event filtering)
//! - Clustering tuning

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory being organized; all cluster folders are direct children
    pub root: PathBuf,

    /// Where the engine persists its `{embeddings, contents}` state
    pub state_file: PathBuf,

    /// Push-channel server settings
    pub server: ServerConfig,

    /// File watcher settings
    pub watcher: WatcherConfig,

    /// Clustering settings
    pub clustering: ClusteringConfig,
}

/// Push-channel server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind to (localhost only)
    pub port: u16,
}

/// File watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Delay after a creation event before the file is organized,
    /// so a still-being-written file is not read mid-write
    pub settle_delay_ms: u64,

    /// Strict mode: only act on events whose parent directory is the
    /// watched root itself. Off by default; when off, every
    /// non-directory event is processed and the idempotence guard in
    /// the placement path keeps re-triggered moves safe.
    pub root_only_events: bool,
}

/// Clustering tuning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Dendrogram cut distance for threshold-linkage clustering
    pub distance_threshold: f32,

    /// Lower bound on k for centroid-k clustering
    pub min_k: usize,

    /// Upper bound on k for centroid-k clustering
    pub max_k: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("test_docs"),
            state_file: PathBuf::from("clusters.bin"),
            server: ServerConfig::default(),
            watcher: WatcherConfig::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8001 }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            root_only_events: false,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 1.5,
            min_k: 2,
            max_k: 8,
        }
    }
}
