//! Vote endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use talentshow_common::AppResult;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, VoteResponse},
};

/// Cast vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub act_id: String,
    pub rating: i32,
    /// Device or user identity; omitted for anonymous votes
    pub voter_id: Option<String>,
}

/// Prior vote lookup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVoteRequest {
    pub act_id: String,
    pub voter_id: String,
}

/// List votes request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVotesRequest {
    pub act_id: String,
}

/// Cast a rating. A repeat from the same voter answers `409 ALREADY_VOTED`
/// with the stored vote in `details`.
async fn cast(
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let vote = state
        .voting_service
        .cast_vote(&req.act_id, req.rating, req.voter_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(vote.into()))
}

/// The caller's earlier vote on an act, or `null`.
async fn mine(
    State(state): State<AppState>,
    Json(req): Json<MyVoteRequest>,
) -> AppResult<ApiResponse<Option<VoteResponse>>> {
    let vote = state
        .voting_service
        .find_vote(&req.act_id, &req.voter_id)
        .await?;
    Ok(ApiResponse::ok(vote.map(Into::into)))
}

async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ListVotesRequest>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let votes = state.voting_service.list_votes(&req.act_id).await?;
    Ok(ApiResponse::ok(votes.into_iter().map(Into::into).collect()))
}

/// Create the votes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cast", post(cast))
        .route("/mine", post(mine))
        .route("/list", post(list))
}
