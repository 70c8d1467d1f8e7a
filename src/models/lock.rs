use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::LockLedgerReason;
use crate::entities::{forfeited_lock_entity, lock_ledger_entry_entity};

/// 冷却中的没收锁
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingForfeiture {
    /// 关联预测，预测被删后为空
    pub tip_id: Option<i64>,
    pub forfeited_at: DateTime<Utc>,
    pub release_at: DateTime<Utc>,
}

impl From<forfeited_lock_entity::Model> for PendingForfeiture {
    fn from(m: forfeited_lock_entity::Model) -> Self {
        PendingForfeiture {
            tip_id: m.tip_id,
            forfeited_at: m.forfeited_at,
            release_at: m.release_at,
        }
    }
}

/// 锁余额响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LockBalanceResponse {
    /// 当前可用锁数
    pub available: i32,
    /// 配置上限
    pub max_locks: i32,
    /// 累计扣减
    pub spent_total: i32,
    /// 累计归还
    pub returned_total: i32,
    /// 冷却中的没收锁，按归还时间升序
    pub pending_forfeitures: Vec<PendingForfeiture>,
    /// 最近一个归还时间点
    pub next_return_at: Option<DateTime<Utc>>,
}

/// 账本流水响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LockLedgerEntryResponse {
    pub id: i64,
    pub tip_id: Option<i64>,
    /// +1 归还，-1 扣减
    pub delta: i32,
    pub reason: LockLedgerReason,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<lock_ledger_entry_entity::Model> for LockLedgerEntryResponse {
    fn from(m: lock_ledger_entry_entity::Model) -> Self {
        LockLedgerEntryResponse {
            id: m.id,
            tip_id: m.tip_id,
            delta: m.delta,
            reason: m.reason,
            created_at: m.created_at,
        }
    }
}

/// 流水查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LockEntryQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

/// 定时归还汇总
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplenishmentSummary {
    /// 成功结算的记录数
    pub records_applied: i64,
    /// 被并发 tick 抢走而跳过的记录数
    pub records_skipped: i64,
    /// 发现的数据不一致数
    pub inconsistencies: i64,
}

impl ReplenishmentSummary {
    pub fn new() -> Self {
        Self {
            records_applied: 0,
            records_skipped: 0,
            inconsistencies: 0,
        }
    }
}

impl Default for ReplenishmentSummary {
    fn default() -> Self {
        Self::new()
    }
}
