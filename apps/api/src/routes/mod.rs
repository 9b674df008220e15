pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::catalog::handlers as catalog;
use crate::generation::handlers as passes;
use crate::redemption::handlers as redemption;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog API
        .route("/api/v1/tiers", get(passes::handle_list_tiers))
        .route("/api/v1/themes", get(catalog::handle_list_themes))
        .route("/api/v1/stores", get(catalog::handle_list_stores))
        .route("/api/v1/catalog/reload", post(catalog::handle_reload_catalog))
        // Pass API
        .route("/api/v1/passes", post(passes::handle_generate_pass))
        .route("/api/v1/passes/:id", get(passes::handle_get_pass))
        .route(
            "/api/v1/users/:user_id/passes",
            get(passes::handle_list_user_passes),
        )
        // Redemption API
        .route(
            "/api/v1/benefits/validate",
            post(redemption::handle_validate_code),
        )
        .route("/api/v1/benefits/redeem", post(redemption::handle_redeem_code))
        .with_state(state)
}
