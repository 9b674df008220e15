//! Axum route handlers for the Redemption API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::redemption::ledger::{RedemptionResult, ValidationResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateCodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RedeemCodeRequest {
    pub code: String,
    #[serde(default)]
    pub pass_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /api/v1/benefits/validate
///
/// Read-only check of a code. Unknown codes are a normal `valid: false` answer.
pub async fn handle_validate_code(
    State(state): State<AppState>,
    Json(request): Json<ValidateCodeRequest>,
) -> Result<Json<ValidationResult>, AppError> {
    let catalog = state.catalog.snapshot();
    let result = state.ledger.validate(&catalog, &request.code).await?;
    Ok(Json(result))
}

/// POST /api/v1/benefits/redeem
///
/// Marks a code used. Replays return the original record; unknown codes are
/// rejected with `INVALID_CODE`.
pub async fn handle_redeem_code(
    State(state): State<AppState>,
    Json(request): Json<RedeemCodeRequest>,
) -> Result<Json<RedemptionResult>, AppError> {
    let catalog = state.catalog.snapshot();
    let result = state
        .ledger
        .redeem(&catalog, &request.code, request.pass_id, request.user_id)
        .await?;
    Ok(Json(result))
}
