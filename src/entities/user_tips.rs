use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 锁定预测的结算状态机
/// none -> pending（锁定时），pending -> returned / forfeited（计分时）
/// forfeited 是历史事实，定时归还只动账本不改这里
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "tip_lock_state")]
#[serde(rename_all = "snake_case")]
pub enum TipLockState {
    #[sea_orm(string_value = "none")]
    None,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "forfeited")]
    Forfeited,
}

impl std::fmt::Display for TipLockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TipLockState::None => write!(f, "none"),
            TipLockState::Pending => write!(f, "pending"),
            TipLockState::Returned => write!(f, "returned"),
            TipLockState::Forfeited => write!(f, "forfeited"),
        }
    }
}

/// 用户预测表实体
/// 预测由外部提交入口创建；option_id 为空表示所选选项已被删除
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user_tips")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub option_id: Option<i64>,
    pub locked: bool,
    pub lock_state: TipLockState,
    pub lock_committed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
