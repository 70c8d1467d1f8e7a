use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient locks: {0}")]
    InsufficientLocks(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Ledger inconsistency: {0}")]
    LedgerInconsistency(String),

    #[error("External data error: {0}")]
    ExternalDataError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::InsufficientLocks(msg) => {
                log::warn!("Insufficient locks: {msg}");
                (
                    actix_web::http::StatusCode::CONFLICT,
                    "INSUFFICIENT_LOCKS",
                    msg.clone(),
                )
            }
            AppError::ConcurrencyConflict(msg) => {
                log::warn!("Concurrency conflict: {msg}");
                (
                    actix_web::http::StatusCode::CONFLICT,
                    "CONCURRENCY_CONFLICT",
                    msg.clone(),
                )
            }
            AppError::LedgerInconsistency(msg) => {
                // 账本守恒被破坏属于程序缺陷，完整上下文进日志，响应里不展开
                log::error!("Ledger inconsistency: {msg}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "LEDGER_INCONSISTENCY",
                    "Ledger inconsistency".to_string(),
                )
            }
            AppError::ExternalDataError(msg) => {
                log::error!("External data error: {msg}");
                (
                    actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTERNAL_DATA_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::ValidationError("x".to_string()), StatusCode::BAD_REQUEST),
            (AppError::InsufficientLocks("x".to_string()), StatusCode::CONFLICT),
            (AppError::ConcurrencyConflict("x".to_string()), StatusCode::CONFLICT),
            (
                AppError::LedgerInconsistency("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::ExternalDataError("x".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::AuthError("x".to_string()), StatusCode::UNAUTHORIZED),
            (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
        ];
        for (err, expected) in cases {
            assert_eq!(err.error_response().status(), expected, "{err}");
        }
    }

    #[actix_web::test]
    async fn test_ledger_inconsistency_hides_detail() {
        let err = AppError::LedgerInconsistency("user 7 reclaim failed".to_string());
        let body = actix_web::body::to_bytes(err.error_response().into_body())
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("LEDGER_INCONSISTENCY"));
        assert!(!body.contains("user 7"));
    }
}
