//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    // No foreign key: notices outlive deleted acts
                    .col(ColumnDef::new(Notification::ActId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Notification::SubmittedBy)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::ContactEmail).string_len(254))
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(ColumnDef::new(Notification::EditHistory).json().not_null())
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: act_id (notices for one act)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_act_id")
                    .table(Notification::Table)
                    .col(Notification::ActId)
                    .to_owned(),
            )
            .await?;

        // Index: is_read (unread inbox)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_is_read")
                    .table(Notification::Table)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    ActId,
    SubmittedBy,
    ContactEmail,
    NotificationType,
    Message,
    EditHistory,
    IsRead,
    CreatedAt,
}
