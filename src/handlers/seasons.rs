use crate::models::SeasonResponse;
use crate::services::SeasonService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/seasons/active",
    tag = "seasons",
    responses(
        (status = 200, description = "获取当前活跃赛季成功，无活跃赛季时 data 为 null", body = SeasonResponse)
    )
)]
/// 当前活跃赛季（公开接口）
pub async fn get_active_season(service: web::Data<SeasonService>) -> Result<HttpResponse> {
    match service.get_active_season(Utc::now().date_naive()).await {
        Ok(season) => {
            let data = season.map(SeasonResponse::from);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn seasons_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/seasons").route("/active", web::get().to(get_active_season)));
}
