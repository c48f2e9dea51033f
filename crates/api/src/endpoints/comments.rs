//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use talentshow_common::AppResult;
use talentshow_core::SubmitCommentInput;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, CommentResponse},
};

/// Request naming one comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIdRequest {
    pub comment_id: String,
}

/// Approved comments request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsRequest {
    pub act_id: String,
}

async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.submit_comment(input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Approved comments for an act, newest first.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListCommentsRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_approved(&req.act_id).await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

async fn approve(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.approve_comment(&req.comment_id).await?;
    Ok(ApiResponse::ok(comment.into()))
}

async fn delete(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete_comment(&req.comment_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Moderation queue, oldest first.
async fn pending(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_pending().await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .route("/list", post(list))
        .route("/approve", post(approve))
        .route("/delete", post(delete))
        .route("/pending", post(pending))
}
