//! Trivia question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trivia")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub question: String,

    /// Answer options (JSON array of strings)
    #[sea_orm(column_type = "Json")]
    pub options: JsonValue,

    /// Index into `options`
    pub correct_option: i32,

    /// At most one trivia question is active at a time
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the option list.
    pub fn option_list(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_value(self.options.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::trivia_tally::Entity")]
    TriviaTally,
}

impl Related<super::trivia_tally::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TriviaTally.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
