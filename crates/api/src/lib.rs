//! HTTP API layer for talentshow.
//!
//! - **Endpoints**: JSON `POST` endpoints for audience and admin actions
//! - **Extractors**: admin authentication
//! - **Middleware**: bearer-token resolution against the configured admins
//! - **SSE**: one Server-Sent-Events stream per live view
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod sse;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
