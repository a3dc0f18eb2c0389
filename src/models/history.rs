//! # 변경 이력 모델
//!
//! 페이지가 저장될 때마다 남는 스냅샷 한 건을 표현합니다.
//! 이력은 추가만 가능하며 수정/삭제되지 않습니다.

use serde::Serialize;

/// 이력 종류: 생성(+), 변경(~), 삭제(-)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryType {
    Created,
    Changed,
    Deleted,
}

impl HistoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryType::Created => "+",
            HistoryType::Changed => "~",
            HistoryType::Deleted => "-",
        }
    }
}

/// 이력 한 건 — DB의 `page_history` 테이블 한 행과
/// 직전 이력의 변경 사유(`previous_change_reason`)를 함께 담습니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PageHistory {
    pub history_id: i64,
    pub page_id: String,
    pub page_no: i64,
    pub volume_no: i64,
    #[serde(rename = "type")]
    pub page_type: String,
    pub version_no: i64,
    pub scanned_text: String,
    pub typed_text: String,
    pub comments: String,
    pub history_type: String,
    pub change_reason: Option<String>,
    pub history_user_id: Option<String>,
    /// 이 저장에서 업로드된 파일의 SHA-256 (파일이 바뀌지 않았으면 None)
    pub content_sha256: Option<String>,
    pub history_date: String,
    pub previous_change_reason: Option<String>,
}

/// `GET /api/v1/pages/:id/history` 응답
#[derive(Debug, Serialize)]
pub struct PageHistoryResponse {
    pub history: Vec<PageHistory>,
    pub revert_disabled: bool,
}
