//! Create comment table migration.

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
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::ActId).string_len(32).not_null())
                    .col(ColumnDef::new(Comment::Text).string_len(1024))
                    .col(ColumnDef::new(Comment::Emoji).string_len(64))
                    .col(
                        ColumnDef::new(Comment::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_act")
                            .from(Comment::Table, Comment::ActId)
                            .to(Act::Table, Act::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (act_id, approved, created_at) for the audience feed
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_act_approved_created")
                    .table(Comment::Table)
                    .col(Comment::ActId)
                    .col(Comment::Approved)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    ActId,
    Text,
    Emoji,
    Approved,
    CreatedAt,
}
