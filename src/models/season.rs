use chrono::{NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::season_entity;

/// 赛季响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeasonResponse {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 按今天（UTC）判断是否进行中
    pub is_active: bool,
}

impl From<season_entity::Model> for SeasonResponse {
    fn from(m: season_entity::Model) -> Self {
        let today = Utc::now().date_naive();
        SeasonResponse {
            is_active: m.is_active_on(today),
            id: m.id,
            name: m.name,
            start_date: m.start_date,
            end_date: m.end_date,
        }
    }
}
