//! # 페이지 변경 이력 라우트 핸들러
//!
//! - `GET  /api/v1/pages/{id}/history`                          → 이력 (최신순)
//! - `POST /api/v1/pages/{id}/history/{history_id}/revert`      → 리비전으로 되돌리기

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    db,
    error::AppError,
    middleware::auth::Viewer,
    models::{Page, PageHistoryResponse},
};

use super::pages::AppState;

pub async fn list_page_history(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Json<PageHistoryResponse>, AppError> {
    viewer.require_staff()?;

    let history = state
        .store
        .versions()
        .history(state.store.pool(), &id)
        .await?;
    // 삭제된 페이지의 이력도 볼 수 있어야 하므로 pages 행이 아니라 이력 유무로 판단합니다.
    if history.history.is_empty() && db::get_page(state.store.pool(), &id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(history))
}

pub async fn revert_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((id, history_id)): Path<(String, i64)>,
) -> Result<Json<Page>, AppError> {
    viewer.require_staff()?;
    let page = state.store.revert(&id, history_id, &viewer.user_id).await?;
    Ok(Json(page))
}
