use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum LinkedinAccounts {
    Table,
    Id,
    UserId,
    AccessToken,
    ProfileId,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScheduledPosts {
    Table,
    Id,
    UserId,
    Platform,
    Content,
    ImageUrl,
    ScheduledTime,
    ScheduledTimeDisplay,
    Status,
    Attempts,
    MaxAttempts,
    LastAttempt,
    Error,
    LinkedinPostId,
    LinkedinUrl,
    PostedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LinkedinAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkedinAccounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LinkedinAccounts::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LinkedinAccounts::AccessToken)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkedinAccounts::ProfileId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkedinAccounts::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LinkedinAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LinkedinAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScheduledPosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledPosts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::Platform)
                            .string_len(16)
                            .not_null()
                            .default("linkedin"),
                    )
                    .col(ColumnDef::new(ScheduledPosts::Content).text().not_null())
                    .col(ColumnDef::new(ScheduledPosts::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(ScheduledPosts::ScheduledTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::ScheduledTimeDisplay)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::MaxAttempts)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::LastAttempt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ScheduledPosts::Error).text().null())
                    .col(
                        ColumnDef::new(ScheduledPosts::LinkedinPostId)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(ScheduledPosts::LinkedinUrl).text().null())
                    .col(
                        ColumnDef::new(ScheduledPosts::PostedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledPosts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // due-set scan: status + scheduled_time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scheduled_posts_status_time")
                    .table(ScheduledPosts::Table)
                    .col(ScheduledPosts::Status)
                    .col(ScheduledPosts::ScheduledTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scheduled_posts_user")
                    .table(ScheduledPosts::Table)
                    .col(ScheduledPosts::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ScheduledPosts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(LinkedinAccounts::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
