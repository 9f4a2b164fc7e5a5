use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catsync_core::config::DEFAULT_CONFIG_FILE;
use catsync_core::{
    load_config, validate_config, CategoryDeriver, CategoryOptions, CategorySync,
    GazelleGamesClient, MetadataProvider, PlatformTable, QBittorrentClient, SanitizedConfig,
    SyncOptions, TorrentClient,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env before logging so RUST_LOG can come from it.
    // Real environment variables take precedence.
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("catsync {}", VERSION);

    match dotenv {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to read .env"),
    }

    // Determine config path: explicit file must exist, default one is optional
    let config_path = match std::env::var("CATSYNC_CONFIG") {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file, using environment only"),
    }

    // Load and validate before any client is built
    let config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    debug!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    info!("Initializing qBittorrent client at {}", config.qbittorrent.url);
    let torrent_client: Arc<dyn TorrentClient> = Arc::new(
        QBittorrentClient::new(config.qbittorrent.clone())
            .context("Failed to create qBittorrent client")?,
    );

    info!("Initializing GazelleGames client at {}", config.tracker.api_url);
    let metadata: Arc<dyn MetadataProvider> = Arc::new(
        GazelleGamesClient::new(config.tracker.clone())
            .context("Failed to create GazelleGames client")?,
    );

    let deriver = CategoryDeriver::new(
        PlatformTable::builtin(),
        CategoryOptions::from(&config.sync),
    );
    let sync = CategorySync::new(
        SyncOptions::from_config(&config),
        torrent_client,
        metadata,
        deriver,
    );

    if sync.options().dry_run {
        info!("Dry run: categories will be logged, not written");
    }

    let outcome = sync.run().await.context("Category sync failed")?;

    info!(
        "Done: {} ({} categories known)",
        outcome.report,
        outcome.known_categories.len()
    );
    debug!(
        "Known categories: {}",
        outcome.known_categories.iter().collect::<Vec<_>>().join(", ")
    );
    Ok(())
}
