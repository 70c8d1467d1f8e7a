use crate::models::*;
use crate::services::LeaderboardService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(
        ("season_id" = Option<i64>, Query, description = "赛季ID，不填则取当前活跃赛季，无活跃赛季时给全期榜"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "获取积分榜成功", body = LeaderboardResponse),
        (status = 404, description = "指定赛季不存在")
    )
)]
/// 积分榜（公开接口）。总分降序，同分按计分事件数降序，再按用户名升序
pub async fn get_leaderboard(
    service: web::Data<LeaderboardService>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse> {
    match service.standings(&query.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn leaderboard_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/leaderboard").route("", web::get().to(get_leaderboard)));
}
