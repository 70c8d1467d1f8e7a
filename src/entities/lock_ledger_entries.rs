use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 账本每动一次的原因码
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "lock_ledger_reason")]
#[serde(rename_all = "snake_case")]
pub enum LockLedgerReason {
    /// 锁定预测时扣减
    #[sea_orm(string_value = "spent")]
    Spent,
    /// 锁定命中，立即归还
    #[sea_orm(string_value = "returned_correct")]
    ReturnedCorrect,
    /// 没收冷却期满，定时归还
    #[sea_orm(string_value = "returned_scheduled")]
    ReturnedScheduled,
    /// 事件作废，原样归还
    #[sea_orm(string_value = "returned_void")]
    ReturnedVoid,
    /// 重算回滚先前的归还
    #[sea_orm(string_value = "recompute_reversal")]
    RecomputeReversal,
}

impl std::fmt::Display for LockLedgerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockLedgerReason::Spent => write!(f, "spent"),
            LockLedgerReason::ReturnedCorrect => write!(f, "returned_correct"),
            LockLedgerReason::ReturnedScheduled => write!(f, "returned_scheduled"),
            LockLedgerReason::ReturnedVoid => write!(f, "returned_void"),
            LockLedgerReason::RecomputeReversal => write!(f, "recompute_reversal"),
        }
    }
}

/// 账本流水实体，只增不改
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lock_ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub tip_id: Option<i64>,
    /// +1 归还，-1 扣减
    pub delta: i32,
    pub reason: LockLedgerReason,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
