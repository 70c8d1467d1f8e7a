use crate::entities::{
    LockLedgerReason, TipLockState, forfeited_lock_entity as forfeits, user_tip_entity as tips,
};
use crate::error::{AppError, AppResult};
use crate::models::ReplenishmentSummary;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};

use crate::services::LockLedgerService;

#[derive(Clone)]
pub struct ReplenishmentService {
    pool: DatabaseConnection,
    ledger: LockLedgerService,
}

impl ReplenishmentService {
    pub fn new(pool: DatabaseConnection, ledger: LockLedgerService) -> Self {
        Self { pool, ledger }
    }

    /// 把所有冷却期满且未结算的没收记录逐条归还。
    /// 每条记录独立事务，坏数据只记日志跳过，不影响其余记录
    pub async fn run_replenishment(&self) -> AppResult<ReplenishmentSummary> {
        let now = Utc::now();
        let due_ids: Vec<i64> = forfeits::Entity::find()
            .filter(forfeits::Column::AppliedAt.is_null())
            .filter(forfeits::Column::ReleaseAt.lte(now))
            .order_by_asc(forfeits::Column::ReleaseAt)
            .all(&self.pool)
            .await?
            .iter()
            .map(|r| r.id)
            .collect();

        let mut summary = ReplenishmentSummary::new();
        for record_id in due_ids {
            match self.apply_record(record_id).await {
                Ok(true) => summary.records_applied += 1,
                Ok(false) => summary.records_skipped += 1,
                Err(err) => {
                    summary.inconsistencies += 1;
                    log::error!("Replenishment of record {record_id} failed: {err}");
                }
            }
        }

        if summary.records_applied > 0 || summary.inconsistencies > 0 {
            log::info!(
                "Replenishment done: {} applied, {} skipped, {} inconsistencies",
                summary.records_applied,
                summary.records_skipped,
                summary.inconsistencies
            );
        }
        Ok(summary)
    }

    /// 结算单条没收记录。返回 false 表示已被并发的另一轮扫描抢走。
    /// 失败时整个事务回滚，claimed_at 一并释放，下一轮会重试并再次暴露问题
    async fn apply_record(&self, record_id: i64) -> AppResult<bool> {
        let txn = self.pool.begin().await?;
        let now = Utc::now();

        // 先抢占，单条记录只允许一轮扫描结算
        let claim = forfeits::Entity::update_many()
            .col_expr(forfeits::Column::ClaimedAt, Expr::value(now))
            .col_expr(forfeits::Column::UpdatedAt, Expr::value(now))
            .filter(forfeits::Column::Id.eq(record_id))
            .filter(forfeits::Column::ClaimedAt.is_null())
            .filter(forfeits::Column::AppliedAt.is_null())
            .exec(&txn)
            .await?;
        if claim.rows_affected == 0 {
            return Ok(false);
        }

        let record = forfeits::Entity::find_by_id(record_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::LedgerInconsistency(format!(
                    "forfeited lock record {record_id} vanished mid-claim"
                ))
            })?;

        // 记录必须还挂着一条没收状态的预测，否则说明台账和预测表已经脱节
        let tip_id = record.tip_id.ok_or_else(|| {
            AppError::LedgerInconsistency(format!(
                "forfeited lock record {record_id} references a deleted tip"
            ))
        })?;
        let tip = tips::Entity::find_by_id(tip_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::LedgerInconsistency(format!(
                    "forfeited lock record {record_id} references missing tip {tip_id}"
                ))
            })?;
        if tip.lock_state != TipLockState::Forfeited {
            return Err(AppError::LedgerInconsistency(format!(
                "forfeited lock record {record_id} expects tip {tip_id} to be forfeited, found {}",
                tip.lock_state
            )));
        }

        // 锁状态保持 forfeited 不动，历史事实只进台账
        let applied = self
            .ledger
            .release_tx(&txn, record.user_id, record.tip_id, LockLedgerReason::ReturnedScheduled)
            .await?;
        if !applied {
            log::error!(
                "Scheduled return for record {record_id} (user {}) swallowed at cap, marking applied anyway",
                record.user_id
            );
        }

        forfeits::Entity::update_many()
            .col_expr(forfeits::Column::AppliedAt, Expr::value(now))
            .col_expr(forfeits::Column::UpdatedAt, Expr::value(now))
            .filter(forfeits::Column::Id.eq(record_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!(
            "Returned forfeited lock to user {} (record {record_id}, tip {tip_id})",
            record.user_id
        );
        Ok(true)
    }
}
