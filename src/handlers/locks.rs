use crate::models::*;
use crate::services::{LockLedgerService, ReplenishmentService};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/locks/balance",
    tag = "locks",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取锁余额成功", body = LockBalanceResponse),
        (status = 401, description = "未授权")
    )
)]
/// 当前用户的锁代币余额（可用 / 已用 / 已还），附未到期的没收记录。
/// 从未用过锁的用户会按当前配额自动初始化
pub async fn get_balance(
    service: web::Data<LockLedgerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.balance(user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/locks/entries",
    tag = "locks",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取台账流水成功", body = PaginatedLockEntries),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取当前用户的锁台账流水（倒序）
pub async fn get_entries(
    service: web::Data<LockLedgerService>,
    req: HttpRequest,
    query: web::Query<LockEntryQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list_entries(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/locks/replenish",
    tag = "locks",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "归还扫描完成", body = ReplenishmentSummary),
        (status = 401, description = "未授权")
    )
)]
/// 手动触发一轮冷却期满归还扫描（与定时任务同一套逻辑）。
/// 坏数据逐条记入汇总，不会中断整轮扫描
pub async fn replenish(service: web::Data<ReplenishmentService>) -> Result<HttpResponse> {
    match service.run_replenishment().await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": summary }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn locks_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/locks")
            .route("/balance", web::get().to(get_balance))
            .route("/entries", web::get().to(get_entries))
            .route("/replenish", web::post().to(replenish)),
    );
}
