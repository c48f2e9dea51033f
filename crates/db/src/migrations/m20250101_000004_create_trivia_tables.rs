//! Create trivia and trivia_tally tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trivia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Trivia::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Trivia::Question).text().not_null())
                    .col(ColumnDef::new(Trivia::Options).json().not_null())
                    .col(ColumnDef::new(Trivia::CorrectOption).integer().not_null())
                    .col(
                        ColumnDef::new(Trivia::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Trivia::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trivia_is_active")
                    .table(Trivia::Table)
                    .col(Trivia::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TriviaTally::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TriviaTally::TriviaId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TriviaTally::OptionIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TriviaTally::AnswerCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(TriviaTally::TriviaId)
                            .col(TriviaTally::OptionIndex),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trivia_tally_trivia")
                            .from(TriviaTally::Table, TriviaTally::TriviaId)
                            .to(Trivia::Table, Trivia::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TriviaTally::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Trivia::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Trivia {
    Table,
    Id,
    Question,
    Options,
    CorrectOption,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum TriviaTally {
    Table,
    TriviaId,
    OptionIndex,
    AnswerCount,
}
