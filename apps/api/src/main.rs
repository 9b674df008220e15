mod catalog;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod redemption;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::{CatalogHandle, JsonCatalogProvider};
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::redemption::RedemptionLedger;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{LedgerStore, MemoryStore, PassStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pass API v{}", env!("CARGO_PKG_VERSION"));

    // Load catalog
    let provider = Arc::new(JsonCatalogProvider::new(config.catalog_dir.clone()));
    let catalog = CatalogHandle::load(provider)
        .await
        .with_context(|| format!("Failed to load catalog from {}", config.catalog_dir.display()))?;
    if catalog.snapshot().is_empty() {
        warn!("Catalog is empty; pass generation will fail until it is reloaded");
    }

    // Initialize persistence: PostgreSQL when configured, memory otherwise
    let (passes, ledger_store): (Arc<dyn PassStore>, Arc<dyn LedgerStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                ensure_schema(&pool).await?;
                let store = Arc::new(PgStore::new(pool));
                (store.clone() as Arc<dyn PassStore>, store as Arc<dyn LedgerStore>)
            }
            None => {
                warn!("DATABASE_URL not set; passes and redemptions are kept in memory only");
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn PassStore>, store as Arc<dyn LedgerStore>)
            }
        };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("ANTHROPIC_API_KEY not set; passes will use rule-based selection only");
    }

    // Build app state
    let state = AppState {
        catalog: Arc::new(catalog),
        llm: Arc::new(llm),
        passes,
        ledger: RedemptionLedger::new(ledger_store),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
