use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono::{Duration, TimeZone};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 赛季实体，日期范围两端都含
/// 赛季的创建与报名由外部管理端维护，这里只消费
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "seasons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 指定日期落在赛季内
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 与另一个日期范围是否有交集（闭区间）
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// 聚合用的 UTC 半开时间窗: [start 00:00, end 次日 00:00)
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = Utc.from_utc_datetime(&self.start_date.and_time(NaiveTime::MIN));
        let to = Utc.from_utc_datetime(&(self.end_date + Duration::days(1)).and_time(NaiveTime::MIN));
        (from, to)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(start: (i32, u32, u32), end: (i32, u32, u32)) -> Model {
        Model {
            id: 1,
            name: "2025-26".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_active_on_boundary_days() {
        let s = season((2025, 10, 1), (2026, 4, 30));
        assert!(s.is_active_on(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
        assert!(s.is_active_on(NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()));
        assert!(!s.is_active_on(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()));
        assert!(!s.is_active_on(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()));
    }

    #[test]
    fn test_overlap_detection() {
        let s = season((2025, 10, 1), (2026, 4, 30));
        // 单日交集也算重叠
        assert!(s.overlaps(
            NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
        ));
        assert!(!s.overlaps(
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
        ));
    }

    #[test]
    fn test_window_covers_last_day() {
        let s = season((2025, 10, 1), (2025, 10, 31));
        let (from, to) = s.window();
        assert_eq!(from.to_rfc3339(), "2025-10-01T00:00:00+00:00");
        // 半开区间，10-31 全天都在窗内
        assert_eq!(to.to_rfc3339(), "2025-11-01T00:00:00+00:00");
    }
}
