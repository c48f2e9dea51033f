//! Audience comment on an act, hidden until approved.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub act_id: String,

    #[sea_orm(nullable)]
    pub text: Option<String>,

    #[sea_orm(nullable)]
    pub emoji: Option<String>,

    #[sea_orm(default_value = false)]
    pub approved: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::act::Entity",
        from = "Column::ActId",
        to = "super::act::Column::Id",
        on_delete = "Cascade"
    )]
    Act,
}

impl Related<super::act::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Act.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
