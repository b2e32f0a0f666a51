//! spotirfid-bridge - RFID tag scans to Spotify playback
//!
//! Without a subcommand the bridge serves the HTTP API. The remaining
//! subcommands manage reader records in the same database.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spotirfid_bridge::provision::generate_reader_id;
use spotirfid_bridge::settings::{resolve_database_path, Overrides, Settings};
use spotirfid_bridge::spotify::SpotifyClient;
use spotirfid_bridge::{build_router, AppState};
use spotirfid_common::config::TomlConfig;
use spotirfid_common::db::{init_database, KvStore};
use spotirfid_common::{ReaderConfig, ReaderDirectory};
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interval between sweeps of expired cache rows
const PURGE_INTERVAL: Duration = Duration::from_secs(600);

/// Command-line arguments for spotirfid-bridge
#[derive(Parser, Debug)]
#[command(name = "spotirfid-bridge")]
#[command(about = "Bridge between RFID tag readers and Spotify playback")]
#[command(version)]
struct Cli {
    /// TOML config file [default: <config dir>/spotirfid/config.toml if present]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database holding readers, tag mappings and cached tokens
    #[arg(long, global = true, env = "SPOTIRFID_DATABASE")]
    database: Option<PathBuf>,

    /// Spotify OAuth client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Spotify OAuth client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Address to listen on [default: 127.0.0.1:8787]
    #[arg(short, long, env = "SPOTIRFID_BIND")]
    bind: Option<String>,

    /// Endpoints to serve: scan, album or all [default: all]
    #[arg(long, env = "SPOTIRFID_ROUTES")]
    routes: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Print a new random reader id
    GenerateReaderId,

    /// Store the configuration of a reader
    ProvisionReader {
        /// Reader id (see generate-reader-id)
        #[arg(long)]
        reader_id: String,

        /// Spotify refresh token for the reader's account
        #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: String,

        /// Spotify device name playback is sent to (exact, case-sensitive)
        #[arg(long)]
        target_device: String,

        /// Human-readable label, e.g. "Bedroom Pi"
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete the configuration of a reader
    RemoveReader {
        #[arg(long)]
        reader_id: String,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            bind: self.bind.clone(),
            database: self.database.clone(),
            routes: self.routes.clone(),
        }
    }

    fn config_file(&self) -> Result<Option<TomlConfig>> {
        let file = match &self.config {
            Some(path) => Some(TomlConfig::load(path)?),
            None => TomlConfig::load_default()?,
        };
        Ok(file)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "spotirfid_bridge=info,spotirfid_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(&cli).await,
        Some(Command::GenerateReaderId) => {
            println!("{}", generate_reader_id());
            Ok(())
        }
        Some(Command::ProvisionReader {
            ref reader_id,
            ref refresh_token,
            ref target_device,
            ref name,
        }) => {
            let pool = open_database(&cli).await?;
            let config = ReaderConfig {
                refresh_token: refresh_token.clone(),
                target_device: target_device.clone(),
                name: name.clone().filter(|n| !n.trim().is_empty()),
            };
            ReaderDirectory::new(pool)
                .provision(reader_id, &config)
                .await
                .context("Failed to provision reader")?;
            info!(reader_id = %reader_id, device = %target_device, "reader provisioned");
            Ok(())
        }
        Some(Command::RemoveReader { ref reader_id }) => {
            let pool = open_database(&cli).await?;
            if ReaderDirectory::new(pool).remove(reader_id).await? {
                info!(reader_id = %reader_id, "reader removed");
            } else {
                warn!(reader_id = %reader_id, "no such reader");
            }
            Ok(())
        }
    }
}

async fn open_database(cli: &Cli) -> Result<SqlitePool> {
    let file = cli.config_file()?;
    let db_path = resolve_database_path(&cli.overrides(), file.as_ref());
    info!("Database: {}", db_path.display());

    init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))
}

async fn serve(cli: &Cli) -> Result<()> {
    info!(
        "Starting SpotiRFID bridge v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let settings = Settings::resolve(cli.overrides(), cli.config_file()?)?;
    info!("Database: {}", settings.database.display());

    let pool = init_database(&settings.database)
        .await
        .with_context(|| format!("Failed to open database {}", settings.database.display()))?;

    spawn_purge_task(pool.clone());

    let spotify = SpotifyClient::new(&settings.accounts_url, &settings.api_url)
        .context("Failed to build HTTP client")?;

    let state = AppState::new(
        pool,
        spotify,
        settings.credentials,
        settings.token_safety_margin,
        settings.routes,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    info!("Listening on http://{} (routes: {})", settings.bind, settings.routes);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

/// Periodically delete expired token-cache rows
fn spawn_purge_task(pool: SqlitePool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match KvStore::purge_expired(&pool).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "purged expired cache entries"),
                Err(e) => error!("Failed to purge expired cache entries: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
