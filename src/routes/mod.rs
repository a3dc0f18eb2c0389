//! # 라우트 핸들러 모듈
//!
//! 각 하위 모듈:
//! - `pages`: 페이지 목록/상세/생성/수정/삭제
//! - `history`: 변경 이력 조회와 되돌리기
//! - `health`: 서버 상태 확인 (헬스체크)

pub mod health;
pub mod history;
pub mod pages;

pub use health::*;
pub use history::*;
pub use pages::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

/// 업로드 요청 본문 최대 크기
/// 스캔본 한도(10,240,000바이트)보다 넉넉하게 두어, 한도를 약간 넘는 파일은
/// 본문 거절 대신 파일 크기 검증 메시지를 받게 합니다.
const MAX_UPLOAD_BODY: usize = 16 * 1024 * 1024;

/// `/api/v1` 아래에 붙는 API 라우터
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/{id}", patch(update_page).delete(delete_page))
        .route("/pages/{id}/history", get(list_page_history))
        .route(
            "/pages/{id}/history/{history_id}/revert",
            post(revert_page),
        )
        .route("/volumes/{volume_no}/pages/{page_no}", get(get_page))
        .route(
            "/volumes/{volume_no}/pages/{page_no}/{type}",
            get(get_page_of_type),
        )
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY))
        .with_state(state)
}
