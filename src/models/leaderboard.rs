use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PaginatedResponse, SeasonResponse};

/// 单用户榜面（服务层排序输出，不带名次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserStanding {
    pub user_id: i64,
    pub username: String,
    pub total_points: i64,
    /// 计过分的事件数
    pub events_scored: i64,
}

/// 带名次的榜面行
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankedStanding {
    /// 全榜名次，从 1 开始
    pub rank: i64,
    pub user_id: i64,
    pub username: String,
    pub total_points: i64,
    pub events_scored: i64,
}

impl RankedStanding {
    pub fn from_standing(rank: i64, s: UserStanding) -> Self {
        RankedStanding {
            rank,
            user_id: s.user_id,
            username: s.username,
            total_points: s.total_points,
            events_scored: s.events_scored,
        }
    }
}

/// 排行榜响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// 生效的赛季；全时段榜为空
    pub season: Option<SeasonResponse>,
    pub standings: PaginatedResponse<RankedStanding>,
}

/// 排行榜查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LeaderboardQuery {
    /// 指定赛季；缺省时自动取进行中的赛季，没有就出全时段榜
    pub season_id: Option<i64>,
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}
