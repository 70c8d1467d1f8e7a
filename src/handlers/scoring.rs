use crate::models::*;
use crate::services::ScoringService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/scoring/outcomes/{event_id}",
    tag = "scoring",
    params(
        ("event_id" = i64, Path, description = "事件ID"),
        ("recompute" = Option<bool>, Query, description = "已计分事件强制重算 (默认false)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "计分完成", body = ScoringSummary),
        (status = 400, description = "截止未到或结果未录入"),
        (status = 401, description = "未授权"),
        (status = 404, description = "事件不存在"),
        (status = 409, description = "并发冲突重试耗尽"),
        (status = 422, description = "结果数据损坏")
    )
)]
/// 给单个事件计分:
/// 1. 截止时间已过且结果已录入才允许计分
/// 2. 已计分事件默认跳过，recompute=true 时先冲销上一轮再重算
/// 3. 计分、锁归还、没收在同一个事务内完成
pub async fn score_outcome(
    service: web::Data<ScoringService>,
    path: web::Path<i64>,
    query: web::Query<ScoreOutcomeQuery>,
) -> Result<HttpResponse> {
    let event_id = path.into_inner();
    let recompute = query.recompute.unwrap_or(false);
    match service.score_outcome(event_id, recompute).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": summary }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/scoring/process-pending",
    tag = "scoring",
    params(
        ("dry_run" = Option<bool>, Query, description = "只统计待计分事件，不落库 (默认false)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "批量计分完成", body = BatchSummary),
        (status = 401, description = "未授权")
    )
)]
/// 扫描所有未计分且截止已过的结果，按出结果先后逐个计分。
/// 单个事件失败不影响其余事件，失败明细随汇总返回
pub async fn process_pending(
    service: web::Data<ScoringService>,
    query: web::Query<ProcessPendingQuery>,
) -> Result<HttpResponse> {
    let dry_run = query.dry_run.unwrap_or(false);
    match service.process_pending_outcomes(dry_run).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": summary }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn scoring_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/scoring")
            .route("/outcomes/{event_id}", web::post().to(score_outcome))
            .route("/process-pending", web::post().to(process_pending)),
    );
}
