use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum EventOutcomes {
    Table,
    ScoreError,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 批量计分失败时把错误内容记到结果行上，便于排查后重跑
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(EventOutcomes::Table)
                    .add_column(
                        ColumnDef::new(EventOutcomes::ScoreError)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(EventOutcomes::Table)
                    .drop_column(EventOutcomes::ScoreError)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
