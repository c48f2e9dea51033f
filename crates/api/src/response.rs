//! API response types.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use talentshow_core::TriviaSnapshot;
use talentshow_db::entities::{
    act::{self, ActStatus},
    comment,
    notification::{self, EditEntry, NotificationType},
    trivia, vote,
};

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Public view of an act.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActResponse {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub description: String,
    pub order: i32,
    pub is_active: bool,
    pub is_voting_open: bool,
    pub votes_count: i32,
    pub score_sum: i64,
    pub avg_score: f64,
    pub status: ActStatus,
    pub submitted_by: String,
    pub submission_date: String,
    pub last_updated: String,
    pub created_at: String,
}

impl From<act::Model> for ActResponse {
    fn from(a: act::Model) -> Self {
        Self {
            avg_score: a.average_score(),
            id: a.id,
            name: a.name,
            grade: a.grade,
            description: a.description,
            order: a.order,
            is_active: a.is_active,
            is_voting_open: a.is_voting_open,
            votes_count: a.votes_count,
            score_sum: a.score_sum,
            status: a.status,
            submitted_by: a.submitted_by,
            submission_date: a.submission_date.to_rfc3339(),
            last_updated: a.last_updated.to_rfc3339(),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

/// Admin view of an act, including the submitter's contact details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActResponse {
    #[serde(flatten)]
    pub act: ActResponse,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl From<act::Model> for AdminActResponse {
    fn from(mut a: act::Model) -> Self {
        let contact_email = a.contact_email.take();
        let contact_phone = a.contact_phone.take();
        Self {
            act: a.into(),
            contact_email,
            contact_phone,
        }
    }
}

/// Vote response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub act_id: String,
    pub rating: i32,
    pub user_id: Option<String>,
    pub created_at: String,
}

impl From<vote::Model> for VoteResponse {
    fn from(v: vote::Model) -> Self {
        Self {
            id: v.id,
            act_id: v.act_id,
            rating: v.rating,
            user_id: v.user_id,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// Comment response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub act_id: String,
    pub text: Option<String>,
    pub emoji: Option<String>,
    pub approved: bool,
    pub created_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            act_id: c.act_id,
            text: c.text,
            emoji: c.emoji,
            approved: c.approved,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Trivia question response.
///
/// The correct option is only filled in for admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaResponse {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<i32>,
    pub is_active: bool,
    pub created_at: String,
}

impl TriviaResponse {
    /// Admin view including the answer.
    #[must_use]
    pub fn with_answer(t: trivia::Model) -> Self {
        let correct = t.correct_option;
        Self {
            correct_option: Some(correct),
            ..t.into()
        }
    }
}

impl From<trivia::Model> for TriviaResponse {
    fn from(t: trivia::Model) -> Self {
        Self {
            options: t.option_list().unwrap_or_default(),
            id: t.id,
            question: t.question,
            correct_option: None,
            is_active: t.is_active,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// Active trivia with live tallies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTriviaResponse {
    pub trivia: TriviaResponse,
    pub results: BTreeMap<i32, i64>,
}

impl From<TriviaSnapshot> for LiveTriviaResponse {
    fn from(s: TriviaSnapshot) -> Self {
        Self {
            trivia: s.trivia.into(),
            results: s.results,
        }
    }
}

/// Notification response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub act_id: String,
    pub submitted_by: String,
    pub contact_email: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub edit_history: Vec<EditEntry>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            edit_history: n.edit_entries().unwrap_or_default(),
            id: n.id,
            act_id: n.act_id,
            submitted_by: n.submitted_by,
            contact_email: n.contact_email,
            notification_type: n.notification_type,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}
