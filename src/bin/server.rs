//! SwopTrader REST Server
//!
//! Serves the SwopTrader collections in the `{success, data}` envelope that
//! the client data layer reads through.
//!
//! # Configuration
//!
//! Environment variables:
//! - `SWOP_SERVER_PORT`: Port to listen on (default: 8080)
//! - `SWOP_SERVER_CONFIG`: Path to the API key file (default: ~/.config/swoptrader-server/config.yaml)
//! - `SWOP_SERVER_SEED`: JSON file loaded into the in-memory store at startup
//! - `SWOP_FIRESTORE_PROJECT`, `SWOP_FIRESTORE_HOST`, `SWOP_FIRESTORE_TOKEN`:
//!   serve from Firestore instead of the in-memory store
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     user_id: "user1"
//! ```
//!
//! With no keys configured the `/api` routes are open.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swoptrader::server::{router, seed_store, ApiKeyStore, AppState};
use swoptrader_core::{DocumentStore, FirestoreClient, FirestoreSettings, MemoryDocumentStore};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Path to the API key file
    config_path: PathBuf,
    /// Seed data for the in-memory store
    seed_path: Option<PathBuf>,
    firestore: Option<FirestoreSettings>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("SWOP_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let config_path = std::env::var("SWOP_SERVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("swoptrader-server")
                    .join("config.yaml")
            });

        let seed_path = std::env::var("SWOP_SERVER_SEED").ok().map(PathBuf::from);

        let firestore = std::env::var("SWOP_FIRESTORE_PROJECT").ok().map(|project| {
            let mut settings = FirestoreSettings::new(project);
            if let Ok(host) = std::env::var("SWOP_FIRESTORE_HOST") {
                settings = settings.with_emulator(host);
            }
            if let Ok(token) = std::env::var("SWOP_FIRESTORE_TOKEN") {
                settings = settings.with_token(token);
            }
            settings
        });

        Self {
            port,
            config_path,
            seed_path,
            firestore,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swoptrader=info,swop_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Config file: {}", config.config_path.display());

    let store: Arc<dyn DocumentStore> = match &config.firestore {
        Some(settings) => {
            tracing::info!("Serving from Firestore project {}", settings.project_id);
            Arc::new(FirestoreClient::new(settings.clone()))
        }
        None => {
            tracing::info!("Serving from the in-memory store");
            let memory = MemoryDocumentStore::new();
            if let Some(seed_path) = &config.seed_path {
                match seed_store(&memory, seed_path).await {
                    Ok(count) => tracing::info!("Seeded {} document(s)", count),
                    Err(e) => {
                        tracing::error!("{}", e);
                        std::process::exit(1);
                    }
                }
            }
            Arc::new(memory)
        }
    };

    let api_keys = ApiKeyStore::load(&config.config_path);
    let app = router(AppState::new(store, api_keys));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
