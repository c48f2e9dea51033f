//! Submitter notification entity.
//!
//! Written whenever an admin changes an act on the submitter's behalf, and
//! consumed by the outbound delivery collaborator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Notification types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    #[sea_orm(string_value = "edit")]
    Edit,
    #[sea_orm(string_value = "approve")]
    Approve,
    #[sea_orm(string_value = "reject")]
    Reject,
}

/// One changed field in an admin edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEntry {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Act the notice is about (kept after the act is deleted)
    #[sea_orm(indexed)]
    pub act_id: String,

    pub submitted_by: String,

    #[sea_orm(nullable)]
    pub contact_email: Option<String>,

    pub notification_type: NotificationType,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    /// Ordered list of [`EditEntry`] (JSON array)
    #[sea_orm(column_type = "Json")]
    pub edit_history: JsonValue,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the edit history.
    pub fn edit_entries(&self) -> Result<Vec<EditEntry>, serde_json::Error> {
        serde_json::from_value(self.edit_history.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
