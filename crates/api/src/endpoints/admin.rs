//! Admin endpoints.

use axum::{Router, extract::State, routing::post};
use serde::Serialize;
use talentshow_common::AppResult;
use talentshow_core::SeedReport;
use tracing::info;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Who the bearer token belongs to.
#[derive(Serialize)]
pub struct WhoAmIResponse {
    pub email: String,
}

/// Load the demo acts and trivia into an empty show.
async fn seed(
    admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SeedReport>> {
    info!(admin = %admin.email, "Seeding demo data");
    let report = state.seed_service.seed_demo().await?;
    Ok(ApiResponse::ok(report))
}

async fn whoami(admin: AdminUser) -> ApiResponse<WhoAmIResponse> {
    ApiResponse::ok(WhoAmIResponse { email: admin.email })
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seed", post(seed))
        .route("/whoami", post(whoami))
}
