//! API endpoints.

mod acts;
mod admin;
mod comments;
mod notifications;
mod trivia;
mod votes;

use axum::Router;

use crate::middleware::AppState;
use crate::sse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/acts", acts::router())
        .nest("/votes", votes::router())
        .nest("/comments", comments::router())
        .nest("/trivia", trivia::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
        .nest("/streaming", sse::router())
}
