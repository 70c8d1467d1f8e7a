use crate::entities::{
    LockLedgerReason, forfeited_lock_entity as forfeits, lock_ledger_entity as ledgers,
    lock_ledger_entry_entity as entries,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    LockBalanceResponse, LockEntryQuery, LockLedgerEntryResponse, PaginatedResponse,
    PaginationParams, PendingForfeiture,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, PostgresQueryBuilder, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

#[derive(Clone)]
pub struct LockLedgerService {
    pool: DatabaseConnection,
    max_locks: i32,
}

impl LockLedgerService {
    pub fn new(pool: DatabaseConnection, max_locks: i32) -> Self {
        Self { pool, max_locks }
    }

    pub fn max_locks(&self) -> i32 {
        self.max_locks
    }

    /// 获取用户锁台账（不存在则按当前配额初始化）
    pub async fn ensure_ledger(&self, user_id: i64) -> AppResult<ledgers::Model> {
        if let Some(ledger) = ledgers::Entity::find()
            .filter(ledgers::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
        {
            return Ok(ledger);
        }

        let txn = self.pool.begin().await?;
        let ledger = self.ensure_ledger_tx(&txn, user_id).await?;
        txn.commit().await?;
        Ok(ledger)
    }

    /// 事务内初始化台账。使用 Upsert 语义（DO NOTHING），并发初始化只会生效一次
    pub async fn ensure_ledger_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> AppResult<ledgers::Model> {
        let insert = Query::insert()
            .into_table(ledgers::Entity)
            .columns([
                ledgers::Column::UserId,
                ledgers::Column::InitialAvailable,
                ledgers::Column::Available,
            ])
            .values_panic([
                user_id.into(),
                self.max_locks.into(),
                self.max_locks.into(),
            ])
            .on_conflict(
                OnConflict::column(ledgers::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();
        let (sql, values) = insert.build(PostgresQueryBuilder);
        let stmt = sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            values,
        );
        txn.execute(stmt).await?;

        ledgers::Entity::find()
            .filter(ledgers::Column::UserId.eq(user_id))
            .one(txn)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!("lock ledger for user {user_id} missing after init"))
            })
    }

    /// 占用一把锁（独立事务）。余额不足返回 InsufficientLocks
    pub async fn reserve(&self, user_id: i64, tip_id: Option<i64>) -> AppResult<ledgers::Model> {
        let txn = self.pool.begin().await?;
        self.reserve_tx(&txn, user_id, tip_id).await?;
        let ledger = self.ensure_ledger_tx(&txn, user_id).await?;
        txn.commit().await?;
        Ok(ledger)
    }

    /// 事务内占用一把锁：available-1 / spent_total+1，条件更新保证不会扣成负数
    pub async fn reserve_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        tip_id: Option<i64>,
    ) -> AppResult<()> {
        self.ensure_ledger_tx(txn, user_id).await?;

        let now = Utc::now();
        let res = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::Available,
                Expr::col(ledgers::Column::Available).sub(1),
            )
            .col_expr(
                ledgers::Column::SpentTotal,
                Expr::col(ledgers::Column::SpentTotal).add(1),
            )
            .col_expr(ledgers::Column::UpdatedAt, Expr::value(now))
            .filter(ledgers::Column::UserId.eq(user_id))
            .filter(ledgers::Column::Available.gt(0))
            .exec(txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::InsufficientLocks(format!(
                "user {user_id} has no available locks"
            )));
        }

        self.append_entry_tx(txn, user_id, tip_id, -1, LockLedgerReason::Spent)
            .await?;
        Ok(())
    }

    /// 归还一把锁（独立事务）。返回是否真正入账
    pub async fn release(
        &self,
        user_id: i64,
        tip_id: Option<i64>,
        reason: LockLedgerReason,
    ) -> AppResult<bool> {
        let txn = self.pool.begin().await?;
        let applied = self.release_tx(&txn, user_id, tip_id, reason).await?;
        txn.commit().await?;
        Ok(applied)
    }

    /// 事务内归还一把锁：available+1 / returned_total+1，条件更新保证不超过配额上限。
    /// 已到上限时整笔吞掉（计数器不动，守恒式仍成立），只留错误日志
    pub async fn release_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        tip_id: Option<i64>,
        reason: LockLedgerReason,
    ) -> AppResult<bool> {
        self.ensure_ledger_tx(txn, user_id).await?;

        let now = Utc::now();
        let res = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::Available,
                Expr::col(ledgers::Column::Available).add(1),
            )
            .col_expr(
                ledgers::Column::ReturnedTotal,
                Expr::col(ledgers::Column::ReturnedTotal).add(1),
            )
            .col_expr(ledgers::Column::UpdatedAt, Expr::value(now))
            .filter(ledgers::Column::UserId.eq(user_id))
            .filter(ledgers::Column::Available.lt(self.max_locks))
            .exec(txn)
            .await?;
        if res.rows_affected == 0 {
            log::error!(
                "Lock release for user {user_id} swallowed: already at cap {} (reason {reason}, tip {tip_id:?})",
                self.max_locks
            );
            return Ok(false);
        }

        self.append_entry_tx(txn, user_id, tip_id, 1, reason).await?;
        Ok(true)
    }

    /// 事务内收回一笔已归还的锁（重算回滚用）：available-1 / returned_total-1。
    /// 用户已把这把锁再次用掉时无法收回，报 LedgerInconsistency 让整个事务回滚
    pub async fn reclaim_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        tip_id: Option<i64>,
    ) -> AppResult<()> {
        let now = Utc::now();
        let res = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::Available,
                Expr::col(ledgers::Column::Available).sub(1),
            )
            .col_expr(
                ledgers::Column::ReturnedTotal,
                Expr::col(ledgers::Column::ReturnedTotal).sub(1),
            )
            .col_expr(ledgers::Column::UpdatedAt, Expr::value(now))
            .filter(ledgers::Column::UserId.eq(user_id))
            .filter(ledgers::Column::Available.gt(0))
            .filter(ledgers::Column::ReturnedTotal.gt(0))
            .exec(txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::LedgerInconsistency(format!(
                "cannot reclaim returned lock from user {user_id}: credit already spent"
            )));
        }

        self.append_entry_tx(txn, user_id, tip_id, -1, LockLedgerReason::RecomputeReversal)
            .await?;
        Ok(())
    }

    async fn append_entry_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        tip_id: Option<i64>,
        delta: i32,
        reason: LockLedgerReason,
    ) -> AppResult<()> {
        entries::ActiveModel {
            user_id: Set(user_id),
            tip_id: Set(tip_id),
            delta: Set(delta),
            reason: Set(reason),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        Ok(())
    }

    /// 用户锁余额概览，附未到期的没收记录
    pub async fn balance(&self, user_id: i64) -> AppResult<LockBalanceResponse> {
        let ledger = self.ensure_ledger(user_id).await?;
        if !ledger.is_conserved() {
            log::error!(
                "Lock ledger conservation violated for user {user_id}: initial={} spent={} returned={} available={}",
                ledger.initial_available,
                ledger.spent_total,
                ledger.returned_total,
                ledger.available
            );
        }

        let pending = forfeits::Entity::find()
            .filter(forfeits::Column::UserId.eq(user_id))
            .filter(forfeits::Column::AppliedAt.is_null())
            .order_by_asc(forfeits::Column::ReleaseAt)
            .all(&self.pool)
            .await?;
        let pending_forfeitures: Vec<PendingForfeiture> =
            pending.into_iter().map(Into::into).collect();
        let next_return_at = pending_forfeitures.first().map(|p| p.release_at);

        Ok(LockBalanceResponse {
            available: ledger.available,
            max_locks: self.max_locks,
            spent_total: ledger.spent_total,
            returned_total: ledger.returned_total,
            pending_forfeitures,
            next_return_at,
        })
    }

    /// 台账流水分页，最新在前
    pub async fn list_entries(
        &self,
        user_id: i64,
        query: &LockEntryQuery,
    ) -> AppResult<PaginatedResponse<LockLedgerEntryResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base = entries::Entity::find().filter(entries::Column::UserId.eq(user_id));

        let total = base.clone().count(&self.pool).await? as i64;
        let rows = base
            .order_by(entries::Column::Id, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let data: Vec<LockLedgerEntryResponse> = rows.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(
            data,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(20),
            total,
        ))
    }
}
