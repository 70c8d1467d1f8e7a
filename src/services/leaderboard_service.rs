use crate::entities::{user_entity as users, user_event_score_entity as scores};
use crate::error::{AppError, AppResult};
use crate::models::{
    LeaderboardQuery, LeaderboardResponse, PaginatedResponse, PaginationParams, RankedStanding,
    UserStanding,
};
use crate::services::SeasonService;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use std::collections::HashMap;

#[derive(Debug, sea_orm::FromQueryResult)]
struct ScoreAggRow {
    user_id: i64,
    total_points: i64,
    events_scored: i64,
}

#[derive(Clone)]
pub struct LeaderboardService {
    pool: DatabaseConnection,
    season_service: SeasonService,
}

impl LeaderboardService {
    pub fn new(pool: DatabaseConnection, season_service: SeasonService) -> Self {
        Self {
            pool,
            season_service,
        }
    }

    /// 积分榜。指定赛季时只统计报名用户在赛季窗口内的得分，
    /// 不指定时落到当前活跃赛季，没有活跃赛季就给全期榜
    pub async fn standings(&self, query: &LeaderboardQuery) -> AppResult<LeaderboardResponse> {
        let season = match query.season_id {
            Some(id) => Some(self.season_service.find_by_id(id).await?.ok_or_else(|| {
                AppError::NotFound(format!("season {id} not found"))
            })?),
            None => {
                self.season_service
                    .get_active_season(Utc::now().date_naive())
                    .await?
            }
        };

        let standings = match &season {
            Some(season) => {
                let user_ids = self.season_service.participant_user_ids(season.id).await?;
                if user_ids.is_empty() {
                    Vec::new()
                } else {
                    let members = users::Entity::find()
                        .filter(users::Column::Id.is_in(user_ids.iter().copied()))
                        .all(&self.pool)
                        .await?;
                    let totals = self
                        .score_totals(Some(&user_ids), Some(season.window()))
                        .await?;
                    merge_standings(
                        members.into_iter().map(|u| (u.id, u.username)).collect(),
                        &totals,
                    )
                }
            }
            None => {
                let members = users::Entity::find().all(&self.pool).await?;
                let totals = self.score_totals(None, None).await?;
                merge_standings(
                    members.into_iter().map(|u| (u.id, u.username)).collect(),
                    &totals,
                )
            }
        };

        let params = PaginationParams::new(query.page, query.per_page);
        let total = standings.len() as i64;
        let ranked: Vec<RankedStanding> = standings
            .into_iter()
            .enumerate()
            .skip(params.get_offset() as usize)
            .take(params.get_limit() as usize)
            .map(|(idx, s)| RankedStanding::from_standing(idx as i64 + 1, s))
            .collect();

        Ok(LeaderboardResponse {
            season: season.map(Into::into),
            standings: PaginatedResponse::new(
                ranked,
                params.page.unwrap_or(1),
                params.page_size.unwrap_or(20),
                total,
            ),
        })
    }

    /// 按用户聚合得分。依赖 (user_id, event_id) 唯一约束，行数即事件数
    async fn score_totals(
        &self,
        user_ids: Option<&[i64]>,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<HashMap<i64, (i64, i64)>> {
        let mut query = scores::Entity::find()
            .select_only()
            .column(scores::Column::UserId)
            .column_as(Expr::col(scores::Column::PointsAwarded).sum(), "total_points")
            .column_as(Expr::val(1).count(), "events_scored")
            .group_by(scores::Column::UserId);
        if let Some(ids) = user_ids {
            query = query.filter(scores::Column::UserId.is_in(ids.iter().copied()));
        }
        if let Some((from, to)) = window {
            query = query
                .filter(scores::Column::AwardedAt.gte(from))
                .filter(scores::Column::AwardedAt.lt(to));
        }

        let rows = query.into_model::<ScoreAggRow>().all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.user_id, (r.total_points, r.events_scored)))
            .collect())
    }
}

/// 拼出全量榜单：没有得分的用户也占一行记 0 分。
/// 排序规则：总分降序，事件数降序，用户名升序兜底保证稳定
pub(crate) fn merge_standings(
    members: Vec<(i64, String)>,
    totals: &HashMap<i64, (i64, i64)>,
) -> Vec<UserStanding> {
    let mut standings: Vec<UserStanding> = members
        .into_iter()
        .map(|(user_id, username)| {
            let (total_points, events_scored) = totals.get(&user_id).copied().unwrap_or((0, 0));
            UserStanding {
                user_id,
                username,
                total_points,
                events_scored,
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| b.events_scored.cmp(&a.events_scored))
            .then_with(|| a.username.cmp(&b.username))
    });
    standings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sorts_by_points_then_events_then_name() {
        let members = vec![
            (1, "carol".to_string()),
            (2, "alice".to_string()),
            (3, "bob".to_string()),
            (4, "dave".to_string()),
        ];
        let totals: HashMap<i64, (i64, i64)> = [
            (1, (10, 4)),
            (2, (10, 5)),
            (3, (12, 3)),
        ]
        .into_iter()
        .collect();

        let standings = merge_standings(members, &totals);
        let order: Vec<&str> = standings.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(order, vec!["bob", "alice", "carol", "dave"]);
        assert_eq!(standings[3].total_points, 0);
        assert_eq!(standings[3].events_scored, 0);
    }

    #[test]
    fn test_merge_breaks_full_ties_by_username() {
        let members = vec![(9, "zoe".to_string()), (8, "amy".to_string())];
        let totals: HashMap<i64, (i64, i64)> =
            [(9, (5, 2)), (8, (5, 2))].into_iter().collect();

        let standings = merge_standings(members, &totals);
        assert_eq!(standings[0].username, "amy");
        assert_eq!(standings[1].username, "zoe");
    }
}
