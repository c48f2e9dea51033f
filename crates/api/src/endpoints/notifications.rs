//! Notifications endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use talentshow_common::AppResult;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, NotificationResponse},
};

/// List notifications request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
    /// Only notifications about this act
    pub act_id: Option<String>,
}

/// Mark-read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: String,
}

/// List notifications, newest first.
async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = match req.act_id {
        Some(act_id) => {
            let all = state.notification_service.list_for_act(&act_id).await?;
            all.into_iter()
                .filter(|n| !req.unread_only || !n.is_read)
                .collect()
        }
        None => state.notification_service.list(req.unread_only).await?,
    };
    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

async fn mark_read(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = state
        .notification_service
        .mark_read(&req.notification_id)
        .await?;
    Ok(ApiResponse::ok(notification.into()))
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/mark-read", post(mark_read))
}
