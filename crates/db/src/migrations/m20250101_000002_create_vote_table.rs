//! Create vote table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_act_table::Act;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::ActId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::Rating).integer().not_null())
                    .col(ColumnDef::new(Vote::UserId).string_len(128))
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_act")
                            .from(Vote::Table, Vote::ActId)
                            .to(Act::Table, Act::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (act_id, user_id) - one vote per identified voter per act.
        // NULL user ids never collide, so anonymous votes are unrestricted.
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_act_user")
                    .table(Vote::Table)
                    .col(Vote::ActId)
                    .col(Vote::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    ActId,
    Rating,
    UserId,
    CreatedAt,
}
