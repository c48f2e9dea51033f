//! Create act table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Act::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Act::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Act::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Act::Grade).string_len(100).not_null())
                    .col(ColumnDef::new(Act::Description).text().not_null())
                    .col(
                        ColumnDef::new(Act::Order)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Act::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Act::IsVotingOpen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Act::ScoreSum)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Act::VotesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Act::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Act::SubmittedBy).string_len(200).not_null())
                    .col(ColumnDef::new(Act::ContactEmail).string_len(254))
                    .col(ColumnDef::new(Act::ContactPhone).string_len(32))
                    .col(
                        ColumnDef::new(Act::SubmissionDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Act::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Act::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Act::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: order (running order listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_act_order")
                    .table(Act::Table)
                    .col(Act::Order)
                    .to_owned(),
            )
            .await?;

        // Index: is_active (active act lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_act_is_active")
                    .table(Act::Table)
                    .col(Act::IsActive)
                    .to_owned(),
            )
            .await?;

        // Index: (status, submission_date) for the moderation queue
        manager
            .create_index(
                Index::create()
                    .name("idx_act_status_submission_date")
                    .table(Act::Table)
                    .col(Act::Status)
                    .col(Act::SubmissionDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Act::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Act {
    Table,
    Id,
    Name,
    Grade,
    Description,
    Order,
    IsActive,
    IsVotingOpen,
    ScoreSum,
    VotesCount,
    Status,
    SubmittedBy,
    ContactEmail,
    ContactPhone,
    SubmissionDate,
    LastUpdated,
    CreatedAt,
    UpdatedAt,
}
