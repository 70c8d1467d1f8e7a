use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum UserTips {
    Table,
    Id,
    Locked,
    LockState,
    LockCommittedAt,
}

#[derive(DeriveIden)]
enum UserEventScores {
    Table,
    LockMultiplier,
}

/// Lock Ledgers (每用户一条锁代币账本)
#[derive(DeriveIden)]
enum LockLedgers {
    Table,
    Id,
    UserId,
    InitialAvailable,
    Available,
    SpentTotal,
    ReturnedTotal,
    CreatedAt,
    UpdatedAt,
}

/// Lock Ledger Entries (账本流水，只增不改)
#[derive(DeriveIden)]
enum LockLedgerEntries {
    Table,
    Id,
    UserId,
    TipId,
    Delta,
    Reason,
    CreatedAt,
}

/// Forfeited Locks (没收锁的定时归还队列)
#[derive(DeriveIden)]
enum ForfeitedLocks {
    Table,
    Id,
    UserId,
    TipId,
    ForfeitedAt,
    ReleaseAt,
    ClaimedAt,
    AppliedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // enums
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("tip_lock_state"))
                    .values(vec![
                        Alias::new("none"),
                        Alias::new("pending"),
                        Alias::new("returned"),
                        Alias::new("forfeited"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("lock_ledger_reason"))
                    .values(vec![
                        Alias::new("spent"),
                        Alias::new("returned_correct"),
                        Alias::new("returned_scheduled"),
                        Alias::new("returned_void"),
                        Alias::new("recompute_reversal"),
                    ])
                    .to_owned(),
            )
            .await?;

        // 预测表加锁定列
        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .add_column(
                        ColumnDef::new(UserTips::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .add_column(
                        ColumnDef::new(UserTips::LockState)
                            .custom(Alias::new("tip_lock_state"))
                            .not_null()
                            .default(Expr::cust("'none'::tip_lock_state")),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .add_column(
                        ColumnDef::new(UserTips::LockCommittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 计分表加倍率列，历史数据按 1 处理
        manager
            .alter_table(
                Table::alter()
                    .table(UserEventScores::Table)
                    .add_column(
                        ColumnDef::new(UserEventScores::LockMultiplier)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        // 账本表
        manager
            .create_table(
                Table::create()
                    .table(LockLedgers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LockLedgers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::InitialAvailable)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::Available)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::SpentTotal)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::ReturnedTotal)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(LockLedgers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个用户一条账本
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lock_ledgers_user_unique")
                    .table(LockLedgers::Table)
                    .col(LockLedgers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(LockLedgers::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_lock_ledgers_user")
                            .from_tbl(LockLedgers::Table)
                            .from_col(LockLedgers::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 流水表
        manager
            .create_table(
                Table::create()
                    .table(LockLedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LockLedgerEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LockLedgerEntries::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgerEntries::TipId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgerEntries::Delta)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgerEntries::Reason)
                            .custom(Alias::new("lock_ledger_reason"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockLedgerEntries::CreatedAt)
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
                    .name("idx_lock_ledger_entries_user")
                    .table(LockLedgerEntries::Table)
                    .col(LockLedgerEntries::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(LockLedgerEntries::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_lock_ledger_entries_user")
                            .from_tbl(LockLedgerEntries::Table)
                            .from_col(LockLedgerEntries::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 流水保留，预测删除时置空
        manager
            .alter_table(
                Table::alter()
                    .table(LockLedgerEntries::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_lock_ledger_entries_tip")
                            .from_tbl(LockLedgerEntries::Table)
                            .from_col(LockLedgerEntries::TipId)
                            .to_tbl(UserTips::Table)
                            .to_col(UserTips::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 归还队列表
        manager
            .create_table(
                Table::create()
                    .table(ForfeitedLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForfeitedLocks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::TipId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::ForfeitedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::ReleaseAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::AppliedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(ForfeitedLocks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 一条预测最多一条归还记录（NULL 不参与唯一约束）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_forfeited_locks_tip_unique")
                    .table(ForfeitedLocks::Table)
                    .col(ForfeitedLocks::TipId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 到期扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_forfeited_locks_release_at")
                    .table(ForfeitedLocks::Table)
                    .col(ForfeitedLocks::ReleaseAt)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ForfeitedLocks::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_forfeited_locks_user")
                            .from_tbl(ForfeitedLocks::Table)
                            .from_col(ForfeitedLocks::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 预测被删后记录悬空，由归还任务当作不一致上报
        manager
            .alter_table(
                Table::alter()
                    .table(ForfeitedLocks::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_forfeited_locks_tip")
                            .from_tbl(ForfeitedLocks::Table)
                            .from_col(ForfeitedLocks::TipId)
                            .to_tbl(UserTips::Table)
                            .to_col(UserTips::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
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
                    .table(ForfeitedLocks::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(LockLedgerEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(LockLedgers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserEventScores::Table)
                    .drop_column(UserEventScores::LockMultiplier)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .drop_column(UserTips::LockCommittedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .drop_column(UserTips::LockState)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserTips::Table)
                    .drop_column(UserTips::Locked)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(
                Type::drop()
                    .name(Alias::new("lock_ledger_reason"))
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("tip_lock_state")).to_owned())
            .await?;
        Ok(())
    }
}
