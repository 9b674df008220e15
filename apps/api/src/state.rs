use std::sync::Arc;

use crate::catalog::CatalogHandle;
use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::redemption::RedemptionLedger;
use crate::storage::PassStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Current catalog snapshot; swapped atomically on reload.
    pub catalog: Arc<CatalogHandle>,
    /// Text-generation service. `LlmClient` in production, scripted in tests.
    pub llm: Arc<dyn TextGenerator>,
    pub passes: Arc<dyn PassStore>,
    pub ledger: RedemptionLedger,
    pub config: Config,
}
