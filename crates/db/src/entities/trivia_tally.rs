//! Per-option answer counter for a trivia question.
//!
//! Rows are created lazily by the first answer; a missing row counts as zero.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trivia_tally")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub trivia_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub option_index: i32,

    pub answer_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trivia::Entity",
        from = "Column::TriviaId",
        to = "super::trivia::Column::Id",
        on_delete = "Cascade"
    )]
    Trivia,
}

impl Related<super::trivia::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trivia.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
