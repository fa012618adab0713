//! orreryd — ephemeris gateway daemon.
//!
//! Serves cached Horizons snapshots over HTTP for the visualization
//! client, with background prewarming of the vectors-mode snapshot.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orrery::server::config::Config;
use orrery::server::{AppContext, router};
use orrery::{
    BodyCatalog, EphemerisSource, HorizonsClient, LocalOnly, LocalWithSharedMirror,
    SingleBodyCache, SnapshotCache, SnapshotStore,
};

/// Orrery daemon — caching ephemeris gateway.
#[derive(Parser)]
#[command(name = "orreryd")]
#[command(version = orrery::PKG_VERSION)]
#[command(about = "Caching ephemeris gateway for the JPL Horizons API")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| orrery::OrreryError::Configuration(format!("invalid address: {e}")))?;

    let catalog = Arc::new(BodyCatalog::builtin());
    let source: Arc<dyn EphemerisSource> =
        Arc::new(HorizonsClient::with_base_url(&config.horizons.base_url)?);
    let snapshot_policy = config.snapshot_policy();

    let store: Arc<dyn SnapshotStore> = match &config.cache.shared_store_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "shared snapshot mirror enabled");
            Arc::new(LocalWithSharedMirror::new(dir, snapshot_policy.clone()))
        }
        None => Arc::new(LocalOnly::new()),
    };

    let snapshot_cache = Arc::new(SnapshotCache::new(
        Arc::clone(&source),
        Arc::clone(&catalog),
        snapshot_policy,
        store,
    ));
    let body_cache = Arc::new(SingleBodyCache::new(source, config.body_policy()));

    let prewarm = snapshot_cache.start_prewarm();
    info!(
        version = orrery::PKG_VERSION,
        %addr,
        prewarm = prewarm.is_some(),
        "orreryd starting"
    );

    let context = Arc::new(AppContext {
        snapshot_cache,
        body_cache,
        catalog,
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(context)).await?;

    Ok(())
}
