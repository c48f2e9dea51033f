//! Server-Sent Events (SSE) for the live views.
//!
//! Each stream owns one [`Subscription`]. The first event is the current
//! snapshot; later events are sent only when the snapshot changes. When the
//! client disconnects the response body is dropped, which drops the
//! subscription and stops its watcher.

#![allow(missing_docs)]

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::Stream;
use serde::Serialize;
use talentshow_core::Subscription;
use tokio_stream::StreamExt;

use crate::{
    middleware::AppState,
    response::{ActResponse, CommentResponse, LiveTriviaResponse},
};

/// Interval between keep-alive comments.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

fn snapshot_stream<T, R, F>(
    event_name: &'static str,
    subscription: Subscription<T>,
    render: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Send + 'static,
    R: Serialize,
    F: Fn(T) -> R + Send + 'static,
{
    let stream = subscription.map(move |snapshot| {
        Ok(Event::default()
            .event(event_name)
            .json_data(render(snapshot))
            .unwrap_or_else(|_| Event::default().event(event_name).data("error")))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("ping"))
}

/// All acts in running order.
async fn acts(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    snapshot_stream("acts", state.live.watch_all_acts(), |acts| {
        acts.into_iter().map(ActResponse::from).collect::<Vec<_>>()
    })
}

/// The act on stage, or `null`.
async fn active_act(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    snapshot_stream("activeAct", state.live.watch_active_act(), |act| {
        act.map(ActResponse::from)
    })
}

/// Approved comments for one act, newest first.
async fn comments(
    State(state): State<AppState>,
    Path(act_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    snapshot_stream(
        "comments",
        state.live.watch_approved_comments(&act_id),
        |comments| {
            comments
                .into_iter()
                .map(CommentResponse::from)
                .collect::<Vec<_>>()
        },
    )
}

/// The active trivia question with its tallies, or `null`.
async fn trivia(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    snapshot_stream("trivia", state.live.watch_active_trivia(), |snapshot| {
        snapshot.map(LiveTriviaResponse::from)
    })
}

/// Create the SSE router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/acts", get(acts))
        .route("/active-act", get(active_act))
        .route("/comments/{act_id}", get(comments))
        .route("/trivia", get(trivia))
}
