//! # 버전 관리 서비스
//!
//! 페이지의 버전 번호와 변경 사유를 결정하고, 저장될 때마다 이력을 남깁니다.
//!
//! 규칙:
//! - 첫 업로드는 버전 1, 사유 "Upload 1"
//! - 파일이 바뀌면 버전 +1, 사유 "Upload {버전}" (설명도 바뀌었으면 ": {설명}" 추가)
//! - 설명만 바뀌면 버전 유지, 사유 "No change."
//!   이 문구는 "파일 변경 없음"이라는 뜻이며, 기존 감사 로그와 맞추기 위해 그대로 씁니다.

use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db;
use crate::error::AppError;
use crate::models::{HistoryType, PageHistoryResponse};

/// 파일 변경 없이 저장될 때의 변경 사유
pub const NO_CONTENT_CHANGE: &str = "No change.";

/// 저장 한 번에 대한 버전 번호와 변경 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub version_no: i64,
    pub change_reason: String,
}

/// 버전 번호와 변경 이력을 관리합니다.
///
/// 되돌리기 허용 여부는 생성 시 설정으로 받습니다.
#[derive(Debug, Clone, Copy)]
pub struct VersionTracker {
    revert_disabled: bool,
}

impl VersionTracker {
    pub fn new(revert_disabled: bool) -> Self {
        Self { revert_disabled }
    }

    /// 새 페이지의 첫 업로드
    pub fn first_upload(&self, comments: &str) -> Revision {
        self.revise(0, true, !comments.is_empty(), comments)
    }

    /// 기존 페이지를 저장할 때의 버전과 사유를 계산합니다.
    pub fn revise(
        &self,
        current_version: i64,
        content_changed: bool,
        comments_changed: bool,
        comments: &str,
    ) -> Revision {
        if !content_changed {
            return Revision {
                version_no: current_version,
                change_reason: NO_CONTENT_CHANGE.to_string(),
            };
        }

        let version_no = current_version + 1;
        let mut change_reason = format!("Upload {}", version_no);
        if comments_changed {
            change_reason.push_str(": ");
            change_reason.push_str(comments);
        }
        Revision {
            version_no,
            change_reason,
        }
    }

    /// 현재 페이지 행을 이력에 기록합니다.
    pub async fn record(
        &self,
        conn: &mut SqliteConnection,
        page_id: &str,
        history_type: HistoryType,
        change_reason: Option<&str>,
        actor: &str,
        content_sha256: Option<&str>,
    ) -> Result<(), AppError> {
        db::insert_history(
            conn,
            page_id,
            history_type,
            change_reason,
            Some(actor),
            content_sha256,
        )
        .await
    }

    /// 페이지 이력을 최신순으로 조회합니다.
    pub async fn history(
        &self,
        pool: &SqlitePool,
        page_id: &str,
    ) -> Result<PageHistoryResponse, AppError> {
        let history = db::list_history(pool, page_id).await?;
        Ok(PageHistoryResponse {
            history,
            revert_disabled: self.revert_disabled,
        })
    }

    pub fn ensure_revert_allowed(&self) -> Result<(), AppError> {
        if self.revert_disabled {
            return Err(AppError::Forbidden(
                "Reverting to a previous revision is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// 업로드된 파일 내용의 SHA-256 (16진수 소문자)
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
