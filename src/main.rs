//! TopicFS - semantic folder organizer
//!
//! Main entry point: wires the engine owner, the folder watcher and
//! the push-channel server together around one watched directory.

use std::path::PathBuf;
use std::sync::Arc;

use topic_fs::core::config::AppConfig;
use topic_fs::embedding::HashingEmbedder;
use topic_fs::engine::{self, Analyzer};
use topic_fs::extract::ExtractorService;
use topic_fs::server::{self, ServerContext};
use topic_fs::watcher::{FolderWatcher, FolderWatcherConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = AppConfig::default();
    if let Some(root) = std::env::args().nth(1) {
        config.root = PathBuf::from(root);
    }

    // Bootstrap the watched directory and normalize the root so every
    // path the engine compares is absolute
    std::fs::create_dir_all(&config.root)?;
    config.root = config.root.canonicalize()?;
    tracing::info!(root = %config.root.display(), "starting TopicFS");

    let embedder = Arc::new(HashingEmbedder::default());
    let extractor = Arc::new(ExtractorService::new());
    let analyzer = Analyzer::new(embedder, config.clustering.clone())
        .with_state_file(config.state_file.clone());

    let (engine, snapshots) = engine::spawn(analyzer, extractor, config.root.clone());

    let watcher_config = FolderWatcherConfig {
        settle_delay: std::time::Duration::from_millis(config.watcher.settle_delay_ms),
        root_only_events: config.watcher.root_only_events,
        ..FolderWatcherConfig::default()
    };
    let mut watcher = FolderWatcher::new(config.root.clone(), watcher_config);
    watcher.start(engine.clone())?;

    let context = ServerContext {
        engine,
        snapshots,
    };
    server::serve(context, config.server.port).await?;

    watcher.stop().await;
    Ok(())
}
