use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 预测事件表实体
/// 事件与选项由外部数据源维护，计分引擎只读
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prediction_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// 答对一次的基础分
    pub points: i32,
    pub opens_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 截止后才允许计分
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline <= now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
