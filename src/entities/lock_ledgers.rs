use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 锁代币账本实体（每用户一条）
/// 说明:
/// - initial_available: 建账时的初始额度
/// - available: 当前可用数，扣减/归还都走条件更新，不做读改写
/// - spent_total / returned_total: 累计扣减与累计归还
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lock_ledgers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub initial_available: i32,
    pub available: i32,
    pub spent_total: i32,
    pub returned_total: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 守恒校验: initial - spent + returned == available
    pub fn is_conserved(&self) -> bool {
        self.initial_available - self.spent_total + self.returned_total == self.available
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(initial: i32, available: i32, spent: i32, returned: i32) -> Model {
        Model {
            id: 1,
            user_id: 2,
            initial_available: initial,
            available,
            spent_total: spent,
            returned_total: returned,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_conservation_holds_through_spend_and_return() {
        // 初始 3，扣 2 还 1
        assert!(ledger(3, 2, 2, 1).is_conserved());
        // 全新账本
        assert!(ledger(3, 3, 0, 0).is_conserved());
    }

    #[test]
    fn test_conservation_detects_drift() {
        assert!(!ledger(3, 3, 2, 1).is_conserved());
        assert!(!ledger(3, 0, 2, 1).is_conserved());
    }
}
