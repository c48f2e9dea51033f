//! Act entity: one scored performance in the show.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of an act.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
#[derive(Default)]
pub enum ActStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ActStatus {
    /// String form used in the database and in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "act")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Grade label, e.g. "Grade 3"
    pub grade: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Performance sequence (ascending)
    #[sea_orm(indexed)]
    pub order: i32,

    /// At most one act is active at a time
    pub is_active: bool,

    /// Only meaningful while `is_active`
    pub is_voting_open: bool,

    /// Running sum of all vote ratings
    pub score_sum: i64,

    /// Number of votes cast
    pub votes_count: i32,

    pub status: ActStatus,

    /// Free-text contact identity of whoever submitted the act
    pub submitted_by: String,

    #[sea_orm(nullable)]
    pub contact_email: Option<String>,

    #[sea_orm(nullable)]
    pub contact_phone: Option<String>,

    pub submission_date: DateTimeWithTimeZone,

    /// Last moderation or metadata change
    pub last_updated: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Mean rating, derived from the running sum. Zero when nobody voted.
    #[must_use]
    pub fn average_score(&self) -> f64 {
        if self.votes_count <= 0 {
            return 0.0;
        }
        self.score_sum as f64 / f64::from(self.votes_count)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
