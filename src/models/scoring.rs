use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// 单事件计分汇总
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoringSummary {
    /// 事件ID
    pub event_id: i64,
    /// 本次完成计分的事件数（0 或 1）
    pub events_scored: i64,
    /// 已计分且未带 recompute，整体跳过
    pub already_scored: bool,
    /// 作废事件，按中立规则处理
    pub forfeited_event: bool,
    /// 扫到的预测条数
    pub tips_processed: i64,
    /// 写入的计分行数
    pub scores_written: i64,
    /// 本次发出的总分
    pub points_total: i64,
    /// 立即归还的锁数
    pub locks_returned: i64,
    /// 没收进冷却队列的锁数
    pub locks_forfeited: i64,
}

impl ScoringSummary {
    pub fn new(event_id: i64) -> Self {
        Self {
            event_id,
            events_scored: 0,
            already_scored: false,
            forfeited_event: false,
            tips_processed: 0,
            scores_written: 0,
            points_total: 0,
            locks_returned: 0,
            locks_forfeited: 0,
        }
    }

    /// 已计分事件的原样跳过
    pub fn skipped(event_id: i64) -> Self {
        let mut s = Self::new(event_id);
        s.already_scored = true;
        s
    }
}

/// 批量计分里单个事件的失败记录，不中断整批
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchEventError {
    pub event_id: i64,
    pub error: String,
}

/// 批量计分汇总
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchSummary {
    /// 本轮批处理关联ID，日志按它检索
    pub run_id: Uuid,
    pub dry_run: bool,
    /// 候选事件数（未计分且已过截止）
    pub candidates: i64,
    pub events_scored: i64,
    pub events_skipped: i64,
    pub forfeited_events: i64,
    pub scores_written: i64,
    pub points_total: i64,
    pub locks_returned: i64,
    pub locks_forfeited: i64,
    pub errors: Vec<BatchEventError>,
}

impl BatchSummary {
    pub fn new(run_id: Uuid, dry_run: bool) -> Self {
        Self {
            run_id,
            dry_run,
            candidates: 0,
            events_scored: 0,
            events_skipped: 0,
            forfeited_events: 0,
            scores_written: 0,
            points_total: 0,
            locks_returned: 0,
            locks_forfeited: 0,
            errors: Vec::new(),
        }
    }

    /// 把单事件汇总并进批汇总
    pub fn absorb(&mut self, summary: &ScoringSummary) {
        if summary.already_scored {
            self.events_skipped += 1;
            return;
        }
        self.events_scored += summary.events_scored;
        if summary.forfeited_event {
            self.forfeited_events += 1;
        }
        self.scores_written += summary.scores_written;
        self.points_total += summary.points_total;
        self.locks_returned += summary.locks_returned;
        self.locks_forfeited += summary.locks_forfeited;
    }
}

/// scoreOutcome 查询参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScoreOutcomeQuery {
    /// 对已计分事件强制重算（先回滚之前的账本影响）
    pub recompute: Option<bool>,
}

/// processAllPendingOutcomes 查询参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProcessPendingQuery {
    /// 只统计候选，不落库
    pub dry_run: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_counts_scored_and_skipped() {
        let mut batch = BatchSummary::new(Uuid::new_v4(), false);

        let mut scored = ScoringSummary::new(1);
        scored.events_scored = 1;
        scored.scores_written = 5;
        scored.points_total = 12;
        scored.locks_returned = 2;
        scored.locks_forfeited = 1;
        batch.absorb(&scored);

        batch.absorb(&ScoringSummary::skipped(2));

        let mut forfeited = ScoringSummary::new(3);
        forfeited.events_scored = 1;
        forfeited.forfeited_event = true;
        forfeited.locks_returned = 1;
        batch.absorb(&forfeited);

        assert_eq!(batch.events_scored, 2);
        assert_eq!(batch.events_skipped, 1);
        assert_eq!(batch.forfeited_events, 1);
        assert_eq!(batch.scores_written, 5);
        assert_eq!(batch.points_total, 12);
        assert_eq!(batch.locks_returned, 3);
        assert_eq!(batch.locks_forfeited, 1);
    }
}
