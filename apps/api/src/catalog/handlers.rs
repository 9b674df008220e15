//! Axum route handlers for the Catalog API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::catalog::{CatalogStats, Store};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ThemesResponse {
    pub themes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StoresResponse {
    pub stores: Vec<Store>,
    pub count: usize,
}

/// GET /api/v1/themes
///
/// Theme tags offered by the catalog's stores, sorted.
pub async fn handle_list_themes(State(state): State<AppState>) -> Json<ThemesResponse> {
    Json(ThemesResponse {
        themes: state.catalog.snapshot().themes(),
    })
}

/// GET /api/v1/stores
///
/// Every store in the current snapshot, with its computed synergy score.
pub async fn handle_list_stores(State(state): State<AppState>) -> Json<StoresResponse> {
    let stores = state.catalog.snapshot().stores().to_vec();
    Json(StoresResponse {
        count: stores.len(),
        stores,
    })
}

/// POST /api/v1/catalog/reload
///
/// Re-reads the catalog files. A failed reload leaves the current snapshot in place.
pub async fn handle_reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<CatalogStats>, AppError> {
    let stats = state.catalog.reload().await?;
    Ok(Json(stats))
}
