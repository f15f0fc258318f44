use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create analysis_tasks table
        manager
            .create_table(
                Table::create()
                    .table(AnalysisTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalysisTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::RequestUuid)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::ExternalId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::AnalysisId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(AnalysisTasks::Url).string().not_null())
                    .col(
                        ColumnDef::new(AnalysisTasks::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::Result)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // All three sweep queries filter on status
        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_tasks_status")
                    .table(AnalysisTasks::Table)
                    .col(AnalysisTasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_tasks_request_uuid")
                    .table(AnalysisTasks::Table)
                    .col(AnalysisTasks::RequestUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_tasks_external_id")
                    .table(AnalysisTasks::Table)
                    .col(AnalysisTasks::ExternalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_tasks_analysis_id")
                    .table(AnalysisTasks::Table)
                    .col(AnalysisTasks::AnalysisId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnalysisTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AnalysisTasks {
    Table,
    Id,
    RequestUuid,
    ExternalId,
    AnalysisId,
    Url,
    Status,
    RetryCount,
    Result,
    CreatedAt,
    UpdatedAt,
}
