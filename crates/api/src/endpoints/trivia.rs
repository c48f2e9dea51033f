//! Trivia endpoints.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use talentshow_common::AppResult;
use talentshow_core::{CreateTriviaInput, TriviaSummary};

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, TriviaResponse},
};

/// Request naming one trivia question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaIdRequest {
    pub trivia_id: String,
}

/// Answer request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub trivia_id: String,
    pub option_index: i32,
}

/// Activation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub trivia_id: String,
    pub active: bool,
}

/// Answer response.
#[derive(Serialize)]
pub struct AnswerResponse {
    pub results: BTreeMap<i32, i64>,
}

async fn answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let results = state
        .trivia_service
        .answer_trivia(&req.trivia_id, req.option_index)
        .await?;
    Ok(ApiResponse::ok(AnswerResponse { results }))
}

/// Results card: totals and percentages per option.
async fn results(
    State(state): State<AppState>,
    Json(req): Json<TriviaIdRequest>,
) -> AppResult<ApiResponse<TriviaSummary>> {
    let summary = state.trivia_service.summary(&req.trivia_id).await?;
    Ok(ApiResponse::ok(summary))
}

async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<TriviaResponse>>> {
    let trivia = state.trivia_service.list_trivia().await?;
    Ok(ApiResponse::ok(
        trivia.into_iter().map(TriviaResponse::with_answer).collect(),
    ))
}

async fn create(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTriviaInput>,
) -> AppResult<ApiResponse<TriviaResponse>> {
    let trivia = state.trivia_service.create_trivia(input).await?;
    Ok(ApiResponse::ok(TriviaResponse::with_answer(trivia)))
}

async fn set_active(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<ApiResponse<TriviaResponse>> {
    let trivia = state
        .trivia_service
        .set_trivia_active(&req.trivia_id, req.active)
        .await?;
    Ok(ApiResponse::ok(TriviaResponse::with_answer(trivia)))
}

async fn delete(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<TriviaIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.trivia_service.delete_trivia(&req.trivia_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Create the trivia router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/answer", post(answer))
        .route("/results", post(results))
        .route("/list", post(list))
        .route("/create", post(create))
        .route("/set-active", post(set_active))
        .route("/delete", post(delete))
}
