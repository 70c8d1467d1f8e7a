use crate::config::ScoringConfig;
use crate::entities::{
    LockLedgerReason, OutcomeKind, TipLockState, event_option_entity as options,
    event_outcome_entity as outcomes, forfeited_lock_entity as forfeits,
    prediction_event_entity as events, user_event_score_entity as scores,
    user_tip_entity as tips,
};
use crate::error::{AppError, AppResult};
use crate::models::{BatchEventError, BatchSummary, ScoringSummary};
use crate::services::LockLedgerService;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// 锁定且答对时的积分倍率
pub const LOCK_MULTIPLIER: i32 = 2;

#[derive(Clone)]
pub struct ScoringService {
    pool: DatabaseConnection,
    ledger: LockLedgerService,
    config: ScoringConfig,
}

impl ScoringService {
    pub fn new(pool: DatabaseConnection, ledger: LockLedgerService, config: ScoringConfig) -> Self {
        Self {
            pool,
            ledger,
            config,
        }
    }

    /// 给单个事件计分。串行化/死锁类冲突带抖动重试，重试耗尽报 ConcurrencyConflict
    pub async fn score_outcome(&self, event_id: i64, recompute: bool) -> AppResult<ScoringSummary> {
        let mut attempt = 0u32;
        loop {
            match self.score_outcome_once(event_id, recompute).await {
                Err(err) if is_transient_conflict(&err) => {
                    attempt += 1;
                    if attempt > self.config.retry_attempts {
                        return Err(AppError::ConcurrencyConflict(format!(
                            "scoring event {event_id} failed after {attempt} attempts: {err}"
                        )));
                    }
                    log::warn!(
                        "Transient conflict scoring event {event_id} (attempt {attempt}): {err}"
                    );
                    let backoff_ms = {
                        let mut rng = rand::thread_rng();
                        50 * attempt as u64 + rng.gen_range(0..100)
                    };
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                }
                other => return other,
            }
        }
    }

    async fn score_outcome_once(
        &self,
        event_id: i64,
        recompute: bool,
    ) -> AppResult<ScoringSummary> {
        let event = events::Entity::find_by_id(event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {event_id} not found")))?;

        let now = Utc::now();
        if !event.deadline_passed(now) {
            return Err(AppError::ValidationError(format!(
                "event {event_id} deadline has not passed yet"
            )));
        }

        let outcome = outcomes::Entity::find()
            .filter(outcomes::Column::EventId.eq(event_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError(format!("event {event_id} has no resolved outcome"))
            })?;

        if outcome.scored_at.is_some() && !recompute {
            log::info!("Event {event_id} already scored, skipping");
            return Ok(ScoringSummary::skipped(event_id));
        }

        let kind = match outcome.kind() {
            Some(kind) => kind,
            None => {
                let msg = format!(
                    "outcome {} is neither resolved nor forfeited (winning_option_id={:?}, is_forfeited={})",
                    outcome.id, outcome.winning_option_id, outcome.is_forfeited
                );
                self.record_score_error(outcome.id, &msg).await;
                return Err(AppError::ExternalDataError(msg));
            }
        };

        // 胜出选项必须真属于该事件
        if let OutcomeKind::Resolved { winning_option_id } = kind {
            let belongs = options::Entity::find_by_id(winning_option_id)
                .one(&self.pool)
                .await?
                .map(|o| o.event_id == event_id)
                .unwrap_or(false);
            if !belongs {
                let msg = format!(
                    "winning option {winning_option_id} does not belong to event {event_id}"
                );
                self.record_score_error(outcome.id, &msg).await;
                return Err(AppError::ExternalDataError(msg));
            }
        }

        let txn = self.pool.begin().await?;

        // 先抢占结果行，同一事件同一时刻只允许一个计分者进入
        let mut claim = outcomes::Entity::update_many()
            .col_expr(outcomes::Column::ScoredAt, Expr::value(now))
            .col_expr(outcomes::Column::ScoreError, Expr::value(String::new()))
            .col_expr(outcomes::Column::UpdatedAt, Expr::value(now))
            .filter(outcomes::Column::Id.eq(outcome.id));
        if !recompute {
            claim = claim.filter(outcomes::Column::ScoredAt.is_null());
        }
        if claim.exec(&txn).await?.rows_affected == 0 {
            log::info!("Event {event_id} scored by a concurrent run, skipping");
            return Ok(ScoringSummary::skipped(event_id));
        }

        let prior_forfeits = if recompute {
            self.reverse_event_tx(&txn, event_id).await?
        } else {
            HashMap::new()
        };

        let event_tips = tips::Entity::find()
            .filter(tips::Column::EventId.eq(event_id))
            .all(&txn)
            .await?;

        let already_scored_users: HashSet<i64> = scores::Entity::find()
            .filter(scores::Column::EventId.eq(event_id))
            .all(&txn)
            .await?
            .iter()
            .map(|s| s.user_id)
            .collect();

        let actions = build_event_plan(&PlanInput {
            event: &event,
            kind,
            tips: &event_tips,
            already_scored_users: &already_scored_users,
            now,
            cooldown: Duration::days(self.config.forfeit_cooldown_days),
            restart_cooldown: self.config.recompute_restarts_cooldown,
            prior_forfeits: &prior_forfeits,
        });

        let mut summary = ScoringSummary::new(event_id);
        summary.events_scored = 1;
        summary.tips_processed = event_tips.len() as i64;
        summary.forfeited_event = matches!(kind, OutcomeKind::Forfeited);

        self.apply_actions_tx(&txn, event_id, now, &actions, &mut summary)
            .await?;

        txn.commit().await?;
        log::info!(
            "Scored event {event_id}{}: {} tips, {} scores ({} pts), {} locks returned, {} forfeited",
            if recompute { " (recompute)" } else { "" },
            summary.tips_processed,
            summary.scores_written,
            summary.points_total,
            summary.locks_returned,
            summary.locks_forfeited
        );
        Ok(summary)
    }

    /// 重算前先冲销上一轮的产物：删分、收回已入账的归还、撤销没收排队记录，
    /// 锁状态拨回 pending。返回各预测原先的没收时刻，供冷却不重置时沿用
    async fn reverse_event_tx(
        &self,
        txn: &DatabaseTransaction,
        event_id: i64,
    ) -> AppResult<HashMap<i64, DateTime<Utc>>> {
        let deleted = scores::Entity::delete_many()
            .filter(scores::Column::EventId.eq(event_id))
            .exec(txn)
            .await?;
        if deleted.rows_affected > 0 {
            log::info!(
                "Recompute: dropped {} prior scores for event {event_id}",
                deleted.rows_affected
            );
        }

        let settled = tips::Entity::find()
            .filter(tips::Column::EventId.eq(event_id))
            .filter(tips::Column::Locked.eq(true))
            .filter(
                tips::Column::LockState
                    .is_in([TipLockState::Returned, TipLockState::Forfeited]),
            )
            .all(txn)
            .await?;

        let now = Utc::now();
        let mut prior_forfeits = HashMap::new();
        for tip in settled {
            match tip.lock_state {
                TipLockState::Returned => {
                    self.ledger.reclaim_tx(txn, tip.user_id, Some(tip.id)).await?;
                }
                TipLockState::Forfeited => {
                    let record = forfeits::Entity::find()
                        .filter(forfeits::Column::TipId.eq(tip.id))
                        .one(txn)
                        .await?;
                    match record {
                        Some(record) => {
                            if record.applied_at.is_some() {
                                // 定时任务已经把这把锁还了，先收回来
                                self.ledger.reclaim_tx(txn, tip.user_id, Some(tip.id)).await?;
                            }
                            prior_forfeits.insert(tip.id, record.forfeited_at);
                            forfeits::Entity::delete_by_id(record.id).exec(txn).await?;
                        }
                        None => {
                            log::warn!(
                                "Forfeited tip {} has no pending return record, nothing to undo",
                                tip.id
                            );
                        }
                    }
                }
                _ => {}
            }

            tips::Entity::update_many()
                .col_expr(tips::Column::LockState, Expr::value(TipLockState::Pending))
                .col_expr(tips::Column::UpdatedAt, Expr::value(now))
                .filter(tips::Column::Id.eq(tip.id))
                .exec(txn)
                .await?;
        }

        Ok(prior_forfeits)
    }

    async fn apply_actions_tx(
        &self,
        txn: &DatabaseTransaction,
        event_id: i64,
        now: DateTime<Utc>,
        actions: &[TipAction],
        summary: &mut ScoringSummary,
    ) -> AppResult<()> {
        for action in actions {
            if let Some(score) = &action.score {
                scores::ActiveModel {
                    user_id: Set(action.user_id),
                    event_id: Set(event_id),
                    base_points: Set(score.base_points),
                    lock_multiplier: Set(score.multiplier),
                    points_awarded: Set(score.points_awarded),
                    awarded_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                summary.scores_written += 1;
                summary.points_total += score.points_awarded as i64;
            }

            let Some(lock_move) = &action.lock_move else {
                continue;
            };

            // 条件翻转锁状态，已被并发改动就连同账本动作一起跳过
            let target = match lock_move {
                LockMove::ReturnCorrect | LockMove::ReturnVoid => TipLockState::Returned,
                LockMove::Forfeit { .. } => TipLockState::Forfeited,
            };
            let flipped = tips::Entity::update_many()
                .col_expr(tips::Column::LockState, Expr::value(target))
                .col_expr(tips::Column::UpdatedAt, Expr::value(now))
                .filter(tips::Column::Id.eq(action.tip_id))
                .filter(tips::Column::LockState.eq(TipLockState::Pending))
                .exec(txn)
                .await?;
            if flipped.rows_affected == 0 {
                log::warn!(
                    "Tip {} lock state changed underneath scoring, move skipped",
                    action.tip_id
                );
                continue;
            }

            match lock_move {
                LockMove::ReturnCorrect | LockMove::ReturnVoid => {
                    let reason = if matches!(lock_move, LockMove::ReturnCorrect) {
                        LockLedgerReason::ReturnedCorrect
                    } else {
                        LockLedgerReason::ReturnedVoid
                    };
                    let applied = self
                        .ledger
                        .release_tx(txn, action.user_id, Some(action.tip_id), reason)
                        .await?;
                    if applied {
                        summary.locks_returned += 1;
                    }
                }
                LockMove::Forfeit {
                    forfeited_at,
                    release_at,
                } => {
                    forfeits::ActiveModel {
                        user_id: Set(action.user_id),
                        tip_id: Set(Some(action.tip_id)),
                        forfeited_at: Set(*forfeited_at),
                        release_at: Set(*release_at),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    summary.locks_forfeited += 1;
                }
            }
        }
        Ok(())
    }

    /// 把失败原因写回结果行，便于批处理后续重跑。尽力而为，失败只记日志
    async fn record_score_error(&self, outcome_id: i64, message: &str) {
        let res = outcomes::Entity::update_many()
            .col_expr(outcomes::Column::ScoreError, Expr::value(message.to_string()))
            .col_expr(outcomes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(outcomes::Column::Id.eq(outcome_id))
            .exec(&self.pool)
            .await;
        if let Err(err) = res {
            log::error!("Failed to record score error for outcome {outcome_id}: {err}");
        }
    }

    /// 扫描所有未计分且截止已过的结果，按出结果先后逐个计分。
    /// 单个事件失败不影响其余事件，失败原因写回 score_error 并汇总返回
    pub async fn process_pending_outcomes(&self, dry_run: bool) -> AppResult<BatchSummary> {
        let run_id = Uuid::new_v4();
        let now = Utc::now();

        let mut pending = outcomes::Entity::find()
            .filter(outcomes::Column::ScoredAt.is_null())
            .order_by_asc(outcomes::Column::ResolvedAt);
        if let Some(hours) = self.config.hours_back {
            pending = pending.filter(outcomes::Column::ResolvedAt.gte(now - Duration::hours(hours)));
        }
        let pending = pending.all(&self.pool).await?;

        let event_ids: Vec<i64> = pending.iter().map(|o| o.event_id).collect();
        let events_by_id: HashMap<i64, events::Model> = events::Entity::find()
            .filter(events::Column::Id.is_in(event_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        // 只处理截止时间已过的事件
        let candidates: Vec<&outcomes::Model> = pending
            .iter()
            .filter(|o| {
                events_by_id
                    .get(&o.event_id)
                    .map(|e| e.deadline_passed(now))
                    .unwrap_or(false)
            })
            .collect();

        let mut summary = BatchSummary::new(run_id, dry_run);
        summary.candidates = candidates.len() as i64;

        if dry_run {
            for outcome in &candidates {
                log::info!(
                    "[run {run_id}] dry run: event {} would be scored (resolved at {})",
                    outcome.event_id,
                    outcome.resolved_at
                );
            }
            return Ok(summary);
        }

        for outcome in candidates {
            match self.score_outcome(outcome.event_id, false).await {
                Ok(event_summary) => summary.absorb(&event_summary),
                Err(err) => {
                    log::error!(
                        "[run {run_id}] scoring event {} failed: {err}",
                        outcome.event_id
                    );
                    self.record_score_error(outcome.id, &err.to_string()).await;
                    summary.errors.push(BatchEventError {
                        event_id: outcome.event_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        log::info!(
            "[run {run_id}] batch scoring done: {} candidates, {} scored, {} skipped, {} forfeited, {} errors",
            summary.candidates,
            summary.events_scored,
            summary.events_skipped,
            summary.forfeited_events,
            summary.errors.len()
        );
        Ok(summary)
    }
}

fn is_transient_conflict(err: &AppError) -> bool {
    match err {
        AppError::DatabaseError(db) => {
            let msg = db.to_string().to_lowercase();
            msg.contains("deadlock") || msg.contains("serial")
        }
        _ => false,
    }
}

/// 计分方案的纯函数输入，便于脱离数据库验证规则
pub(crate) struct PlanInput<'a> {
    pub event: &'a events::Model,
    pub kind: OutcomeKind,
    pub tips: &'a [tips::Model],
    pub already_scored_users: &'a HashSet<i64>,
    pub now: DateTime<Utc>,
    pub cooldown: Duration,
    pub restart_cooldown: bool,
    pub prior_forfeits: &'a HashMap<i64, DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LockMove {
    ReturnCorrect,
    ReturnVoid,
    Forfeit {
        forfeited_at: DateTime<Utc>,
        release_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreWrite {
    pub base_points: i32,
    pub multiplier: i32,
    pub points_awarded: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TipAction {
    pub tip_id: i64,
    pub user_id: i64,
    pub score: Option<ScoreWrite>,
    pub lock_move: Option<LockMove>,
}

/// 事件计分规则全集：
/// - 作废事件不写分，pending 锁原样归还
/// - 正常事件给所有预测写分，答错记 0 分
/// - 锁定且答对翻倍并立即归还；锁定且答错没收，冷却期满后由定时任务归还
/// - 已有分数的用户跳过
pub(crate) fn build_event_plan(input: &PlanInput) -> Vec<TipAction> {
    let mut actions = Vec::new();
    for tip in input.tips {
        let locked_pending = tip.locked && tip.lock_state == TipLockState::Pending;

        match input.kind {
            OutcomeKind::Forfeited => {
                if locked_pending {
                    actions.push(TipAction {
                        tip_id: tip.id,
                        user_id: tip.user_id,
                        score: None,
                        lock_move: Some(LockMove::ReturnVoid),
                    });
                }
            }
            OutcomeKind::Resolved { winning_option_id } => {
                if input.already_scored_users.contains(&tip.user_id) {
                    continue;
                }

                // option_id 为空（选项已删除）一律按答错处理
                let correct = tip.option_id == Some(winning_option_id);
                let base_points = if correct { input.event.points } else { 0 };
                let multiplier = if correct && tip.locked {
                    LOCK_MULTIPLIER
                } else {
                    1
                };

                let lock_move = if locked_pending {
                    if correct {
                        Some(LockMove::ReturnCorrect)
                    } else {
                        let forfeited_at = if input.restart_cooldown {
                            input.now
                        } else {
                            input
                                .prior_forfeits
                                .get(&tip.id)
                                .copied()
                                .unwrap_or(input.now)
                        };
                        Some(LockMove::Forfeit {
                            forfeited_at,
                            release_at: forfeited_at + input.cooldown,
                        })
                    }
                } else {
                    None
                };

                actions.push(TipAction {
                    tip_id: tip.id,
                    user_id: tip.user_id,
                    score: Some(ScoreWrite {
                        base_points,
                        multiplier,
                        points_awarded: base_points * multiplier,
                    }),
                    lock_move,
                });
            }
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_event(points: i32) -> events::Model {
        let deadline = Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap();
        events::Model {
            id: 7,
            name: "Game 1".to_string(),
            points,
            opens_at: deadline - Duration::days(3),
            deadline,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn test_tip(id: i64, user_id: i64, option_id: Option<i64>, locked: bool) -> tips::Model {
        tips::Model {
            id,
            user_id,
            event_id: 7,
            option_id,
            locked,
            lock_state: if locked {
                TipLockState::Pending
            } else {
                TipLockState::None
            },
            lock_committed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn plan_at(
        event: &events::Model,
        kind: OutcomeKind,
        tips: &[tips::Model],
        now: DateTime<Utc>,
    ) -> Vec<TipAction> {
        build_event_plan(&PlanInput {
            event,
            kind,
            tips,
            already_scored_users: &HashSet::new(),
            now,
            cooldown: Duration::days(30),
            restart_cooldown: true,
            prior_forfeits: &HashMap::new(),
        })
    }

    #[test]
    fn test_correct_locked_tip_doubles_and_returns() {
        let event = test_event(2);
        let tips = vec![test_tip(31, 5, Some(11), true)];
        let now = event.deadline + Duration::hours(1);

        let actions = plan_at(&event, OutcomeKind::Resolved { winning_option_id: 11 }, &tips, now);
        assert_eq!(actions.len(), 1);
        let score = actions[0].score.as_ref().unwrap();
        assert_eq!(score.base_points, 2);
        assert_eq!(score.multiplier, 2);
        assert_eq!(score.points_awarded, 4);
        assert_eq!(actions[0].lock_move, Some(LockMove::ReturnCorrect));
    }

    #[test]
    fn test_incorrect_locked_tip_scores_zero_and_forfeits() {
        let event = test_event(2);
        let tips = vec![test_tip(31, 5, Some(12), true)];
        let now = event.deadline + Duration::hours(1);

        let actions = plan_at(&event, OutcomeKind::Resolved { winning_option_id: 11 }, &tips, now);
        assert_eq!(actions.len(), 1);
        let score = actions[0].score.as_ref().unwrap();
        assert_eq!(score.base_points, 0);
        assert_eq!(score.multiplier, 1);
        assert_eq!(score.points_awarded, 0);
        assert_eq!(
            actions[0].lock_move,
            Some(LockMove::Forfeit {
                forfeited_at: now,
                release_at: now + Duration::days(30),
            })
        );
    }

    #[test]
    fn test_unlocked_tips_score_without_lock_moves() {
        let event = test_event(3);
        let tips = vec![
            test_tip(1, 1, Some(11), false),
            test_tip(2, 2, Some(12), false),
        ];
        let now = event.deadline + Duration::hours(1);

        let actions = plan_at(&event, OutcomeKind::Resolved { winning_option_id: 11 }, &tips, now);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].score.as_ref().unwrap().points_awarded, 3);
        assert_eq!(actions[0].score.as_ref().unwrap().multiplier, 1);
        assert_eq!(actions[1].score.as_ref().unwrap().points_awarded, 0);
        assert!(actions[0].lock_move.is_none());
        assert!(actions[1].lock_move.is_none());
    }

    #[test]
    fn test_deleted_option_counts_as_incorrect() {
        let event = test_event(3);
        let tips = vec![test_tip(1, 1, None, false)];
        let now = event.deadline + Duration::hours(1);

        let actions = plan_at(&event, OutcomeKind::Resolved { winning_option_id: 11 }, &tips, now);
        assert_eq!(actions[0].score.as_ref().unwrap().points_awarded, 0);
    }

    #[test]
    fn test_already_scored_users_are_skipped() {
        let event = test_event(3);
        let tips = vec![
            test_tip(1, 1, Some(11), false),
            test_tip(2, 2, Some(11), false),
        ];
        let now = event.deadline + Duration::hours(1);
        let scored: HashSet<i64> = [1].into_iter().collect();

        let actions = build_event_plan(&PlanInput {
            event: &event,
            kind: OutcomeKind::Resolved { winning_option_id: 11 },
            tips: &tips,
            already_scored_users: &scored,
            now,
            cooldown: Duration::days(30),
            restart_cooldown: true,
            prior_forfeits: &HashMap::new(),
        });
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].user_id, 2);
    }

    #[test]
    fn test_forfeited_event_writes_no_scores_and_returns_pending_locks() {
        let event = test_event(3);
        let mut settled = test_tip(3, 3, Some(12), true);
        settled.lock_state = TipLockState::Returned;
        let tips = vec![
            test_tip(1, 1, Some(11), true),
            test_tip(2, 2, Some(12), false),
            settled,
        ];
        let now = event.deadline + Duration::hours(1);

        let actions = plan_at(&event, OutcomeKind::Forfeited, &tips, now);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].tip_id, 1);
        assert!(actions[0].score.is_none());
        assert_eq!(actions[0].lock_move, Some(LockMove::ReturnVoid));
    }

    #[test]
    fn test_recompute_keeps_original_cooldown_when_configured() {
        let event = test_event(2);
        let tips = vec![test_tip(31, 5, Some(12), true)];
        let now = event.deadline + Duration::days(10);
        let original = event.deadline + Duration::hours(1);
        let prior: HashMap<i64, DateTime<Utc>> = [(31, original)].into_iter().collect();

        let actions = build_event_plan(&PlanInput {
            event: &event,
            kind: OutcomeKind::Resolved { winning_option_id: 11 },
            tips: &tips,
            already_scored_users: &HashSet::new(),
            now,
            cooldown: Duration::days(30),
            restart_cooldown: false,
            prior_forfeits: &prior,
        });
        assert_eq!(
            actions[0].lock_move,
            Some(LockMove::Forfeit {
                forfeited_at: original,
                release_at: original + Duration::days(30),
            })
        );
    }
}
