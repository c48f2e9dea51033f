//! Act endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use talentshow_common::AppResult;
use talentshow_core::{CreateActInput, EditActInput, RegisterActInput};
use talentshow_db::entities::act::ActStatus;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ActResponse, AdminActResponse, ApiResponse, NotificationResponse},
};

/// Request naming one act.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActIdRequest {
    pub act_id: String,
}

/// Acts-by-status request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByStatusRequest {
    pub status: ActStatus,
}

/// Edit act request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditActRequest {
    pub act_id: String,
    #[serde(flatten)]
    pub changes: EditActInput,
}

/// Approve act request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveActRequest {
    pub act_id: String,
    /// Running position; defaults to the next free one
    pub order: Option<i32>,
}

/// Edit act response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditActResponse {
    pub act: AdminActResponse,
    pub notification: Option<NotificationResponse>,
}

/// Next order response.
#[derive(Serialize)]
pub struct NextOrderResponse {
    pub order: i32,
}

/// All acts in running order.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<ActResponse>>> {
    let acts = state.act_service.list_acts().await?;
    Ok(ApiResponse::ok(acts.into_iter().map(Into::into).collect()))
}

/// One act.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<ActResponse>> {
    let act = state.act_service.get_act(&req.act_id).await?;
    Ok(ApiResponse::ok(act.into()))
}

/// Self-service registration.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterActInput>,
) -> AppResult<ApiResponse<ActResponse>> {
    let act = state.act_service.register_act(input).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn by_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ByStatusRequest>,
) -> AppResult<ApiResponse<Vec<AdminActResponse>>> {
    let acts = state.act_service.get_acts_by_status(req.status).await?;
    Ok(ApiResponse::ok(acts.into_iter().map(Into::into).collect()))
}

async fn create(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateActInput>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state.act_service.create_act(input).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn edit(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<EditActRequest>,
) -> AppResult<ApiResponse<EditActResponse>> {
    let outcome = state
        .act_service
        .edit_act(&req.act_id, req.changes, &admin.email)
        .await?;
    Ok(ApiResponse::ok(EditActResponse {
        act: outcome.act.into(),
        notification: outcome.notification.map(Into::into),
    }))
}

async fn delete(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.act_service.delete_act(&req.act_id).await?;
    Ok(ApiResponse::ok(()))
}

async fn activate(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state.act_service.activate(&req.act_id).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn deactivate(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state.act_service.deactivate(&req.act_id).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn open_voting(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state.act_service.open_voting(&req.act_id).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn close_voting(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state.act_service.close_voting(&req.act_id).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn approve(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ApproveActRequest>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state
        .act_service
        .approve_act(&req.act_id, req.order)
        .await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn reject(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ActIdRequest>,
) -> AppResult<ApiResponse<AdminActResponse>> {
    let act = state.act_service.reject_act(&req.act_id).await?;
    Ok(ApiResponse::ok(act.into()))
}

async fn next_order(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<NextOrderResponse>> {
    let order = state.act_service.next_order().await?;
    Ok(ApiResponse::ok(NextOrderResponse { order }))
}

/// Create the acts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/register", post(register))
        .route("/by-status", post(by_status))
        .route("/create", post(create))
        .route("/edit", post(edit))
        .route("/delete", post(delete))
        .route("/activate", post(activate))
        .route("/deactivate", post(deactivate))
        .route("/voting/open", post(open_voting))
        .route("/voting/close", post(close_voting))
        .route("/approve", post(approve))
        .route("/reject", post(reject))
        .route("/next-order", post(next_order))
}
