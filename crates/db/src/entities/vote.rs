//! Vote entity. Votes are immutable once cast.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub act_id: String,

    /// Star rating, 1 to 5
    pub rating: i32,

    /// Soft voter identity; anonymous votes are never de-duplicated
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

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
