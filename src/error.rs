//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 에러 분류:
//! - 입력 검증 실패(`Validation`) → 400, 필드/폼 단위 메시지 그대로 전달
//! - 같은 (권, 쪽, 종류) 페이지 중복(`PageExists`) → 409, 기존 페이지 ID 포함
//! - 조회 실패(`NotFound`) → 404
//! - 파일 저장소 실패(`Storage`) → 500, 관련 DB 변경은 롤백됨

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::PageType;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 입력 (HTTP 400)
    /// 권 번호 범위, 파일 크기/형식, 쪽 번호 필터 문법 등
    #[error("{0}")]
    Validation(String),

    /// 같은 (권, 쪽, 종류)의 페이지가 이미 존재함 (HTTP 409)
    #[error(
        "A {} version of the page {page_no} of volume {volume_no} already exists. \
         Please edit that page instead of creating a new one.",
        .page_type.as_str().to_lowercase()
    )]
    PageExists {
        page_type: PageType,
        page_no: i64,
        volume_no: i64,
        existing_id: String,
    },

    /// 그 밖의 상태 충돌 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 권한 부족 (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 파일 저장소(blob) 쓰기/삭제 실패 (HTTP 500)
    /// #[from]: std::io::Error → AppError::Storage 자동 변환
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// 데이터베이스 오류 (HTTP 500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// SQLite의 UNIQUE 제약 위반인지 확인합니다.
    /// 동시에 같은 페이지를 만든 경우 나중에 커밋한 쪽이 이 에러를 받습니다.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(e) => e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Storage, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::PageExists { ref existing_id, .. } => {
                // 기존 페이지 ID를 함께 돌려주어 클라이언트가 수정 화면으로 이동할 수 있게 합니다.
                let body = Json(json!({
                    "error": {
                        "code": "page_exists",
                        "message": self.to_string(),
                        "existing_id": existing_id,
                    }
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "The document could not be stored".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
