use sea_orm_migration::prelude::*;

/// Users (用户表，账号体系在外部系统，这里只存排行榜展示所需的最小字段)
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    CreatedAt,
    UpdatedAt,
}

/// Prediction Events (预测事件表)
#[derive(DeriveIden)]
enum PredictionEvents {
    Table,
    Id,
    Name,
    Points,
    OpensAt,
    Deadline,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Event Options (事件候选选项)
#[derive(DeriveIden)]
enum EventOptions {
    Table,
    Id,
    EventId,
    Label,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Event Outcomes (事件结果，由外部数据源写入)
#[derive(DeriveIden)]
enum EventOutcomes {
    Table,
    Id,
    EventId,
    WinningOptionId,
    IsForfeited,
    ResolvedAt,
    ScoredAt,
    CreatedAt,
    UpdatedAt,
}

/// User Tips (用户预测记录)
#[derive(DeriveIden)]
enum UserTips {
    Table,
    Id,
    UserId,
    EventId,
    OptionId,
    CreatedAt,
    UpdatedAt,
}

/// User Event Scores (计分结果，每用户每事件最多一条)
#[derive(DeriveIden)]
enum UserEventScores {
    Table,
    Id,
    UserId,
    EventId,
    BasePoints,
    PointsAwarded,
    AwardedAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_username_unique")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 预测事件表
        manager
            .create_table(
                Table::create()
                    .table(PredictionEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PredictionEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::Points)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::OpensAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::Deadline)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(PredictionEvents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 批量计分按截止时间扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prediction_events_deadline")
                    .table(PredictionEvents::Table)
                    .col(PredictionEvents::Deadline)
                    .to_owned(),
            )
            .await?;

        // 选项表
        manager
            .create_table(
                Table::create()
                    .table(EventOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventOptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventOptions::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventOptions::Label)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventOptions::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EventOptions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EventOptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(EventOptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个事件内选项名不重复
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_options_event_label_unique")
                    .table(EventOptions::Table)
                    .col(EventOptions::EventId)
                    .col(EventOptions::Label)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(EventOptions::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_event_options_event")
                            .from_tbl(EventOptions::Table)
                            .from_col(EventOptions::EventId)
                            .to_tbl(PredictionEvents::Table)
                            .to_col(PredictionEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 结果表（每事件一条）
        manager
            .create_table(
                Table::create()
                    .table(EventOutcomes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventOutcomes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::WinningOptionId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::IsForfeited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::ResolvedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::ScoredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(EventOutcomes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_outcomes_event_unique")
                    .table(EventOutcomes::Table)
                    .col(EventOutcomes::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(EventOutcomes::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_event_outcomes_event")
                            .from_tbl(EventOutcomes::Table)
                            .from_col(EventOutcomes::EventId)
                            .to_tbl(PredictionEvents::Table)
                            .to_col(PredictionEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 胜出选项被删除时置空，计分时按坏数据处理
        manager
            .alter_table(
                Table::alter()
                    .table(EventOutcomes::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_event_outcomes_winning_option")
                            .from_tbl(EventOutcomes::Table)
                            .from_col(EventOutcomes::WinningOptionId)
                            .to_tbl(EventOptions::Table)
                            .to_col(EventOptions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 用户预测表
        manager
            .create_table(
                Table::create()
                    .table(UserTips::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserTips::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserTips::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserTips::EventId).big_integer().not_null())
                    .col(ColumnDef::new(UserTips::OptionId).big_integer().null())
                    .col(
                        ColumnDef::new(UserTips::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(UserTips::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 每用户每事件一条预测
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_tips_user_event_unique")
                    .table(UserTips::Table)
                    .col(UserTips::UserId)
                    .col(UserTips::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 计分按事件扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_tips_event")
                    .table(UserTips::Table)
                    .col(UserTips::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_user_tips_user")
                            .from_tbl(UserTips::Table)
                            .from_col(UserTips::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_user_tips_event")
                            .from_tbl(UserTips::Table)
                            .from_col(UserTips::EventId)
                            .to_tbl(PredictionEvents::Table)
                            .to_col(PredictionEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_user_tips_option")
                            .from_tbl(UserTips::Table)
                            .from_col(UserTips::OptionId)
                            .to_tbl(EventOptions::Table)
                            .to_col(EventOptions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 计分结果表
        manager
            .create_table(
                Table::create()
                    .table(UserEventScores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserEventScores::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserEventScores::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEventScores::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEventScores::BasePoints)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserEventScores::PointsAwarded)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserEventScores::AwardedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(UserEventScores::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 幂等计分的硬保证
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_event_scores_user_event_unique")
                    .table(UserEventScores::Table)
                    .col(UserEventScores::UserId)
                    .col(UserEventScores::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 排行榜按时间窗聚合
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_event_scores_awarded_at")
                    .table(UserEventScores::Table)
                    .col(UserEventScores::AwardedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserEventScores::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_user_event_scores_user")
                            .from_tbl(UserEventScores::Table)
                            .from_col(UserEventScores::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserEventScores::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_user_event_scores_event")
                            .from_tbl(UserEventScores::Table)
                            .from_col(UserEventScores::EventId)
                            .to_tbl(PredictionEvents::Table)
                            .to_col(PredictionEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：计分 -> 预测 -> 结果 -> 选项 -> 事件 -> 用户
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(UserEventScores::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(UserTips::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(EventOutcomes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(EventOptions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PredictionEvents::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
