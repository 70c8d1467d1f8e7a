use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 没收锁归还队列实体
/// 计分没收时入队，release_at 到期后由归还任务结算
/// claimed_at 是单条记录的抢占标记，applied_at 非空表示已结算
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "forfeited_locks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub tip_id: Option<i64>,
    pub forfeited_at: DateTime<Utc>,
    pub release_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 到期且未结算
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.applied_at.is_none() && self.release_at <= now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(release_offset_hours: i64, applied: bool) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            user_id: 2,
            tip_id: Some(3),
            forfeited_at: now - Duration::days(30),
            release_at: now + Duration::hours(release_offset_hours),
            claimed_at: None,
            applied_at: if applied { Some(now) } else { None },
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_due_only_after_release_at() {
        let now = Utc::now();
        assert!(record(-1, false).is_due(now));
        assert!(!record(1, false).is_due(now));
    }

    #[test]
    fn test_applied_records_never_due() {
        let now = Utc::now();
        assert!(!record(-1, true).is_due(now));
    }
}
