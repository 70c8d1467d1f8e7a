use crate::entities::{season_entity as seasons, season_participant_entity as participants};
use crate::error::AppResult;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

#[derive(Clone)]
pub struct SeasonService {
    pool: DatabaseConnection,
}

impl SeasonService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 找覆盖指定日期的赛季。赛季互不重叠，最多命中一个
    pub async fn get_active_season(&self, on: NaiveDate) -> AppResult<Option<seasons::Model>> {
        let season = seasons::Entity::find()
            .filter(seasons::Column::StartDate.lte(on))
            .filter(seasons::Column::EndDate.gte(on))
            .order_by_asc(seasons::Column::StartDate)
            .one(&self.pool)
            .await?;
        Ok(season)
    }

    pub async fn find_by_id(&self, season_id: i64) -> AppResult<Option<seasons::Model>> {
        Ok(seasons::Entity::find_by_id(season_id).one(&self.pool).await?)
    }

    /// 赛季报名用户 ID 集合
    pub async fn participant_user_ids(&self, season_id: i64) -> AppResult<Vec<i64>> {
        let rows = participants::Entity::find()
            .filter(participants::Column::SeasonId.eq(season_id))
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|p| p.user_id).collect())
    }

    /// 提交入口用的报名校验
    pub async fn is_enrolled(&self, season_id: i64, user_id: i64) -> AppResult<bool> {
        let row = participants::Entity::find()
            .filter(participants::Column::SeasonId.eq(season_id))
            .filter(participants::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
