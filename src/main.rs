//! Video Catalog Daemon
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! video-catalog
//!
//! # Start with custom config
//! video-catalog --config /path/to/config.toml
//!
//! # Start with custom storage directory and port
//! video-catalog --storage-dir /data/catalog --http-port 8081
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use video_catalog::{CatalogDb, CatalogService, Config, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "video-catalog")]
#[command(about = "Catalog of movie works, their sources and conversion plans")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "VC_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "VC_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// SQLite file name inside the storage directory
    #[arg(long, env = "VC_DB_FILE")]
    db_file: Option<String>,

    /// HTTP API port
    #[arg(long, env = "VC_SERVER_PORT")]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("video_catalog=info".parse()?))
        .init();

    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(db_file) = args.db_file {
        config.db_file = db_file;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }

    info!(
        storage_dir = %config.storage_dir.display(),
        http_port = config.http_port,
        "Starting video-catalog"
    );

    // Ensure storage directory exists
    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .with_context(|| format!("creating {}", config.storage_dir.display()))?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    let db = Arc::new(CatalogDb::open(&config.db_path())?);
    let catalog = Arc::new(CatalogService::new(db));

    let http_addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr()))?;
    let http_server = Arc::new(HttpServer::new(catalog.clone(), http_addr));

    info!("HTTP API available at http://{}", http_addr);
    info!("Press Ctrl+C to stop.");

    // Handle shutdown signal
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown => {}
    }

    // Print stats before exit
    if let Ok(stats) = catalog.stats() {
        info!(
            works = stats.work_count,
            sources = stats.source_count,
            plans = stats.plan_count,
            "Final catalog stats"
        );
    }

    Ok(())
}
