//! # 페이지 변경 이력 쿼리
//!
//! `page_history`는 INSERT만 허용되는 감사 로그입니다
//! (UPDATE/DELETE는 트리거가 막습니다).

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{HistoryType, PageHistory};

/// 페이지 행의 현재 상태를 이력 테이블에 스냅샷으로 복사합니다.
///
/// 삭제 이력은 행을 지우기 전에 남겨야 합니다.
pub async fn insert_history(
    conn: &mut SqliteConnection,
    page_id: &str,
    history_type: HistoryType,
    change_reason: Option<&str>,
    user_id: Option<&str>,
    content_sha256: Option<&str>,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO page_history (page_id, page_no, volume_no, page_type, version_no,
                                  scanned_text, typed_text, comments,
                                  history_type, change_reason, history_user_id, content_sha256)
        SELECT id, page_no, volume_no, page_type, version_no,
               scanned_text, typed_text, comments,
               ?, ?, ?, ?
        FROM pages
        WHERE id = ?
        "#,
    )
    .bind(history_type.as_str())
    .bind(change_reason)
    .bind(user_id)
    .bind(content_sha256)
    .bind(page_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Internal(format!(
            "cannot snapshot missing page {}",
            page_id
        )));
    }
    Ok(())
}

/// 페이지의 이력을 최신순으로 조회합니다.
///
/// 각 항목에는 같은 페이지의 바로 이전 이력의 변경 사유가 함께 실립니다.
/// 저장 순서는 자동 증가하는 `history_id`로 판단합니다.
pub async fn list_history(pool: &SqlitePool, page_id: &str) -> Result<Vec<PageHistory>, AppError> {
    let history = sqlx::query_as::<_, PageHistory>(
        r#"
        SELECT h.history_id, h.page_id, h.page_no, h.volume_no, h.page_type, h.version_no,
               h.scanned_text, h.typed_text, h.comments, h.history_type, h.change_reason,
               h.history_user_id, h.content_sha256, h.history_date,
               (SELECT prev.change_reason
                FROM page_history prev
                WHERE prev.page_id = h.page_id AND prev.history_id < h.history_id
                ORDER BY prev.history_id DESC
                LIMIT 1) AS previous_change_reason
        FROM page_history h
        WHERE h.page_id = ?
        ORDER BY h.history_id DESC
        "#,
    )
    .bind(page_id)
    .fetch_all(pool)
    .await?;

    Ok(history)
}

/// 이력 한 건을 조회합니다.
pub async fn get_history(
    conn: &mut SqliteConnection,
    history_id: i64,
) -> Result<Option<PageHistory>, AppError> {
    let entry = sqlx::query_as::<_, PageHistory>(
        r#"
        SELECT h.history_id, h.page_id, h.page_no, h.volume_no, h.page_type, h.version_no,
               h.scanned_text, h.typed_text, h.comments, h.history_type, h.change_reason,
               h.history_user_id, h.content_sha256, h.history_date,
               NULL AS previous_change_reason
        FROM page_history h
        WHERE h.history_id = ?
        "#,
    )
    .bind(history_id)
    .fetch_optional(conn)
    .await?;

    Ok(entry)
}
