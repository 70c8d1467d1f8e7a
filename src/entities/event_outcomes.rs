use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 事件结果表实体
/// 由外部数据源写入，每事件最多一条；scored_at 由计分引擎回填
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "event_outcomes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub winning_option_id: Option<i64>,
    pub is_forfeited: bool,
    pub resolved_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
    /// 最近一次计分失败的原因，成功后清空
    pub score_error: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 结果的两种合法形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// 正常开奖，带胜出选项
    Resolved { winning_option_id: i64 },
    /// 事件作废（比赛取消等），计分保持中立
    Forfeited,
}

impl Model {
    /// 判定结果形态；胜出选项与作废标记互斥，二者同有或同无都算坏数据
    pub fn kind(&self) -> Option<OutcomeKind> {
        match (self.winning_option_id, self.is_forfeited) {
            (Some(winning_option_id), false) => Some(OutcomeKind::Resolved { winning_option_id }),
            (None, true) => Some(OutcomeKind::Forfeited),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcome(winning: Option<i64>, forfeited: bool) -> Model {
        Model {
            id: 1,
            event_id: 10,
            winning_option_id: winning,
            is_forfeited: forfeited,
            resolved_at: Utc::now(),
            scored_at: None,
            score_error: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_kind_resolved() {
        assert_eq!(
            outcome(Some(7), false).kind(),
            Some(OutcomeKind::Resolved {
                winning_option_id: 7
            })
        );
    }

    #[test]
    fn test_kind_forfeited() {
        assert_eq!(outcome(None, true).kind(), Some(OutcomeKind::Forfeited));
    }

    #[test]
    fn test_kind_rejects_ambiguous_rows() {
        assert_eq!(outcome(Some(7), true).kind(), None);
        assert_eq!(outcome(None, false).kind(), None);
    }
}
