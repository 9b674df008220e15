//! Axum route handlers for the Pass API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::{generate_pass, GenerationLimits};
use crate::models::pass::{Pass, PassTier, TierConfig, UserPreferences};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeneratePassRequest {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub request: String,
    pub tier: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePassResponse {
    pub pass: Pass,
    pub tier: TierConfig,
    pub value_ratio: f64,
    pub quality_met: bool,
    pub attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct PassDetailResponse {
    pub pass: Pass,
    pub tier: TierConfig,
    pub value_ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct UserPassesResponse {
    pub user_id: String,
    pub passes: Vec<Pass>,
}

#[derive(Debug, Serialize)]
pub struct TiersResponse {
    pub tiers: Vec<TierConfig>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/passes
///
/// Generates a pass from themes and free text, stores it, and returns it with
/// its quality report.
pub async fn handle_generate_pass(
    State(state): State<AppState>,
    Json(request): Json<GeneratePassRequest>,
) -> Result<Json<GeneratePassResponse>, AppError> {
    let prefs = preferences_from_request(request)?;
    let catalog = state.catalog.snapshot();
    let limits = GenerationLimits::new(state.config.llm_timeout, state.config.generation_deadline);

    let report = generate_pass(&catalog, state.llm.as_ref(), &prefs, limits).await?;
    state.passes.put_pass(&report.pass).await?;

    info!(
        "Generated {:?} pass {} with {} benefits (quality met: {})",
        prefs.tier,
        report.pass.pass_id,
        report.pass.selections.len(),
        report.quality_met
    );

    Ok(Json(GeneratePassResponse {
        value_ratio: report.pass.value_ratio(),
        tier: report.pass.tier.config(),
        pass: report.pass,
        quality_met: report.quality_met,
        attempts: report.attempts,
    }))
}

/// GET /api/v1/passes/:id
///
/// Returns a stored pass with its current redemptions.
pub async fn handle_get_pass(
    State(state): State<AppState>,
    Path(pass_id): Path<String>,
) -> Result<Json<PassDetailResponse>, AppError> {
    let mut pass = state
        .passes
        .get_pass(&pass_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pass {pass_id} not found")))?;

    state.ledger.attach_redemptions(&mut pass).await?;

    Ok(Json(PassDetailResponse {
        value_ratio: pass.value_ratio(),
        tier: pass.tier.config(),
        pass,
    }))
}

/// GET /api/v1/users/:user_id/passes
///
/// Passes generated for a user, newest first.
pub async fn handle_list_user_passes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPassesResponse>, AppError> {
    let mut passes = state.passes.passes_for_user(&user_id).await?;
    for pass in &mut passes {
        state.ledger.attach_redemptions(pass).await?;
    }

    Ok(Json(UserPassesResponse { user_id, passes }))
}

/// GET /api/v1/tiers
pub async fn handle_list_tiers() -> Json<TiersResponse> {
    Json(TiersResponse {
        tiers: PassTier::ALL.iter().map(|t| t.config()).collect(),
    })
}

/// Validates the request and builds the generation inputs.
///
/// Themes are trimmed and de-duplicated in order; a request needs at least one
/// theme or some free text.
fn preferences_from_request(request: GeneratePassRequest) -> Result<UserPreferences, AppError> {
    let tier = PassTier::parse(&request.tier).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown tier '{}'. Expected one of: light, premium, citizen",
            request.tier
        ))
    })?;

    let mut themes: Vec<String> = Vec::new();
    for theme in request.themes {
        let theme = theme.trim().to_string();
        if !theme.is_empty() && !themes.contains(&theme) {
            themes.push(theme);
        }
    }

    let text = request.request.trim().to_string();
    if themes.is_empty() && text.is_empty() {
        return Err(AppError::Validation(
            "Provide at least one theme or a request".to_string(),
        ));
    }

    let user_id = request.user_id.filter(|u| !u.trim().is_empty());
    Ok(UserPreferences::new(themes, text, tier, user_id))
}
