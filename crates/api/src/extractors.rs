//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use talentshow_common::AppError;

/// Email of the admin a request's bearer token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity(pub String);

/// Authenticated admin extractor.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub email: String,
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<AdminIdentity>()
            .map(|identity| Self {
                email: identity.0.clone(),
            })
            .ok_or(AppError::Unauthorized)
    }
}
