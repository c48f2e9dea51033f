//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use talentshow_common::Config;
use talentshow_core::{
    ActService, CommentService, LiveQueryService, NotificationService, SeedService, TriviaService,
    VotingService,
};
use tracing::debug;

use crate::extractors::AdminIdentity;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub act_service: ActService,
    pub voting_service: VotingService,
    pub comment_service: CommentService,
    pub trivia_service: TriviaService,
    pub notification_service: NotificationService,
    pub seed_service: SeedService,
    pub live: LiveQueryService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to the configured admin's email and stores it
/// in the request extensions. Unknown tokens are ignored here; admin-only
/// handlers reject the request through [`crate::extractors::AdminUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.config.admin_for_token(token.trim()) {
            Some(email) => {
                let identity = AdminIdentity(email.to_string());
                req.extensions_mut().insert(identity);
            }
            None => debug!("Unknown bearer token"),
        }
    }

    next.run(req).await
}
