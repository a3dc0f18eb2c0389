//! # 페이지 저장소 서비스
//!
//! 페이지 생성/수정/삭제를 하나의 트랜잭션으로 처리합니다.
//!
//! 모든 변경은 같은 순서를 따릅니다:
//! 1. 입력 검증 (DB/디스크를 건드리기 전)
//! 2. 트랜잭션 안에서 행 변경 + 이력 기록
//! 3. 파일 쓰기/삭제
//! 4. 커밋
//!
//! 3단계가 실패하면 트랜잭션이 커밋되지 않고 롤백되므로,
//! 없는 파일을 가리키는 행이 남지 않습니다.
//! 기존 파일을 지우는 일(삭제, 확장자가 바뀐 교체)은 커밋이 끝난 뒤에 합니다.
//! 지우기에 실패해 남는 파일은 어떤 행도 가리키지 않으므로 로그만 남깁니다.
//!
//! 쓰기 트랜잭션은 `BEGIN IMMEDIATE`로 시작해 처음부터 쓰기 잠금을 잡습니다.
//! 읽은 뒤에 쓰기 잠금을 올리는 기본 트랜잭션은 다른 쓰기가 먼저 커밋하면
//! 기다리지 않고 "database is locked"로 실패하기 때문입니다.

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db;
use crate::error::AppError;
use crate::models::{HistoryType, NewPage, Page, PageChanges, PageType};
use crate::services::storage::{media_path, MediaStorage};
use crate::services::validation::{resolve_type, validate_volume_no, FileValidator};
use crate::services::versioning::{content_fingerprint, VersionTracker};

/// 페이지 행과 파일, 이력을 함께 관리합니다.
///
/// SqlitePool과 MediaStorage는 복제 비용이 낮으므로 AppState에 그대로 담아 공유합니다.
#[derive(Debug, Clone)]
pub struct PageStore {
    pool: SqlitePool,
    storage: MediaStorage,
    versions: VersionTracker,
}

impl PageStore {
    pub fn new(pool: SqlitePool, storage: MediaStorage, versions: VersionTracker) -> Self {
        Self {
            pool,
            storage,
            versions,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn storage(&self) -> &MediaStorage {
        &self.storage
    }

    pub fn versions(&self) -> &VersionTracker {
        &self.versions
    }

    /// 새 페이지를 만듭니다.
    ///
    /// # 에러
    /// - `Validation`: 권 번호 범위, 파일 슬롯 개수, 파일 크기/형식, 종류 불일치
    /// - `PageExists`: 같은 (권, 쪽, 종류)가 이미 있음
    /// - `Storage`: 파일 쓰기 실패 (행은 저장되지 않음)
    pub async fn create(&self, new_page: NewPage, actor: &str) -> Result<Page, AppError> {
        validate_volume_no(new_page.volume_no)?;
        let page_type = resolve_type(
            new_page.scanned_text.is_some(),
            new_page.typed_text.is_some(),
        )?;
        if let Some(requested) = new_page.page_type {
            if requested != page_type {
                return Err(AppError::Validation(format!(
                    "A {} page needs {} text to be uploaded.",
                    requested.slot_name(),
                    requested.slot_name()
                )));
            }
        }

        let NewPage {
            page_no,
            volume_no,
            comments,
            scanned_text,
            typed_text,
            ..
        } = new_page;
        let upload = scanned_text
            .or(typed_text)
            .ok_or_else(|| AppError::Internal("resolved slot has no upload".to_string()))?;
        FileValidator::for_slot(page_type).validate(&upload)?;

        let path = media_path(volume_no, page_no, page_type, &upload.file_name);
        let revision = self.versions.first_upload(&comments);
        let page = Page {
            id: uuid::Uuid::now_v7().to_string(),
            page_no,
            volume_no,
            page_type,
            version_no: revision.version_no,
            scanned_text: if page_type == PageType::Scanned { path.clone() } else { String::new() },
            typed_text: if page_type == PageType::Typed { path.clone() } else { String::new() },
            comments,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let mut tx = self.begin_write().await?;

        if let Some(existing) = db::find_page(&mut *tx, volume_no, page_no, page_type).await? {
            return Err(page_exists(&existing));
        }

        if let Err(e) = db::insert_page(&mut tx, &page).await {
            if e.is_unique_violation() {
                // 다른 요청이 먼저 커밋한 경우: 트랜잭션을 끝내고 기존 행을 알려줍니다.
                drop(tx);
                return Err(self.conflict_with_existing(volume_no, page_no, page_type).await);
            }
            return Err(e);
        }

        self.versions
            .record(
                &mut tx,
                &page.id,
                HistoryType::Created,
                Some(&revision.change_reason),
                actor,
                Some(&content_fingerprint(&upload.bytes)),
            )
            .await?;

        self.storage.write(&path, &upload.bytes).await?;

        if let Err(e) = tx.commit().await {
            // 커밋 실패 시 방금 쓴 파일을 되돌립니다.
            self.discard_file(&path, "failed to remove uncommitted document")
                .await;
            let err = AppError::from(e);
            if err.is_unique_violation() {
                return Err(self.conflict_with_existing(volume_no, page_no, page_type).await);
            }
            return Err(err);
        }

        tracing::info!(
            page_id = %page.id,
            volume_no,
            page_no,
            page_type = %page_type,
            actor,
            "page created"
        );

        self.reload(&page.id).await
    }

    /// 기존 페이지를 수정합니다.
    ///
    /// 페이지 종류에 맞는 슬롯의 파일만 반영하고, 반대쪽 슬롯의 파일은 무시합니다.
    /// 파일이 바뀌면 버전이 1 오르고, 같은 경로의 이전 파일은 새 파일로 교체됩니다.
    pub async fn update(
        &self,
        id: &str,
        changes: PageChanges,
        actor: &str,
    ) -> Result<Page, AppError> {
        let mut tx = self.begin_write().await?;
        let page = db::get_page(&mut *tx, id).await?.ok_or(AppError::NotFound)?;

        let PageChanges {
            comments,
            scanned_text,
            typed_text,
        } = changes;
        let (upload, ignored) = match page.page_type {
            PageType::Scanned => (scanned_text, typed_text),
            PageType::Typed => (typed_text, scanned_text),
        };
        if let Some(ignored) = ignored {
            tracing::debug!(
                page_id = %page.id,
                file_name = %ignored.file_name,
                "ignoring upload for the other content slot"
            );
        }
        if let Some(upload) = &upload {
            FileValidator::for_slot(page.page_type).validate(upload)?;
        }

        let new_comments = comments.unwrap_or_else(|| page.comments.clone());
        let comments_changed = new_comments != page.comments;
        let revision = self.versions.revise(
            page.version_no,
            upload.is_some(),
            comments_changed,
            &new_comments,
        );

        let mut updated = page.clone();
        updated.version_no = revision.version_no;
        updated.comments = new_comments;
        let new_path = upload
            .as_ref()
            .map(|u| media_path(page.volume_no, page.page_no, page.page_type, &u.file_name));
        if let Some(path) = &new_path {
            match page.page_type {
                PageType::Scanned => updated.scanned_text = path.clone(),
                PageType::Typed => updated.typed_text = path.clone(),
            }
        }

        if !db::update_page(&mut tx, &updated, page.version_no).await? {
            return Err(AppError::Conflict(
                "The page was changed by someone else. Reload it and try again.".to_string(),
            ));
        }

        let fingerprint = upload.as_ref().map(|u| content_fingerprint(&u.bytes));
        self.versions
            .record(
                &mut tx,
                &page.id,
                HistoryType::Changed,
                Some(&revision.change_reason),
                actor,
                fingerprint.as_deref(),
            )
            .await?;

        if let (Some(upload), Some(path)) = (&upload, &new_path) {
            self.storage.write(path, &upload.bytes).await?;
        }
        // 확장자가 바뀌면 이전 파일이 다른 경로에 남습니다.
        let superseded = new_path
            .as_deref()
            .filter(|path| *path != page.file_path())
            .map(|_| page.file_path());

        if let Err(e) = tx.commit().await {
            if let (Some(path), Some(_)) = (&new_path, superseded) {
                self.discard_file(path, "failed to remove uncommitted document")
                    .await;
            }
            return Err(e.into());
        }

        if let Some(old_path) = superseded {
            self.discard_file(old_path, "failed to remove superseded document")
                .await;
        }

        tracing::info!(
            page_id = %page.id,
            version_no = revision.version_no,
            reason = %revision.change_reason,
            actor,
            "page updated"
        );

        self.reload(&page.id).await
    }

    /// 페이지를 삭제하고, 페이지 디렉토리의 파일을 모두 지웁니다.
    ///
    /// 같은 (권, 쪽)의 반대 종류 페이지가 남아 있으면 그 페이지에 묶인 파일은 남깁니다.
    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), AppError> {
        let mut tx = self.begin_write().await?;
        let page = db::get_page(&mut *tx, id).await?.ok_or(AppError::NotFound)?;
        let sibling = db::find_page(
            &mut *tx,
            page.volume_no,
            page.page_no,
            page.page_type.other(),
        )
        .await?;

        self.versions
            .record(&mut tx, &page.id, HistoryType::Deleted, None, actor, None)
            .await?;

        if !db::delete_page(&mut tx, &page.id).await? {
            return Err(AppError::NotFound);
        }

        tx.commit().await?;

        let keep: Vec<&str> = sibling.iter().map(|s| s.file_path()).collect();
        let removed = match self
            .storage
            .clear_directory_of(page.file_path(), &keep)
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!(
                    page_id = %page.id,
                    path = %page.file_path(),
                    error = %e,
                    "failed to clear files of deleted page"
                );
                0
            }
        };

        tracing::info!(
            page_id = %page.id,
            volume_no = page.volume_no,
            page_no = page.page_no,
            page_type = %page.page_type,
            removed_files = removed,
            actor,
            "page deleted"
        );
        Ok(())
    }

    /// 이력의 한 리비전으로 설명을 되돌립니다.
    ///
    /// 디스크에는 페이지당 파일 하나만 남으므로, 현재 버전과 같은 버전의
    /// 리비전만 복원할 수 있습니다.
    pub async fn revert(&self, id: &str, history_id: i64, actor: &str) -> Result<Page, AppError> {
        self.versions.ensure_revert_allowed()?;

        let mut tx = self.begin_write().await?;
        let page = db::get_page(&mut *tx, id).await?.ok_or(AppError::NotFound)?;
        let entry = db::get_history(&mut tx, history_id)
            .await?
            .filter(|entry| entry.page_id == page.id)
            .ok_or(AppError::NotFound)?;

        if entry.version_no != page.version_no {
            return Err(AppError::Conflict(format!(
                "Revision {} belongs to upload {}; only revisions of the current upload ({}) can be restored.",
                entry.history_id, entry.version_no, page.version_no
            )));
        }

        let mut updated = page.clone();
        updated.comments = entry.comments;
        if !db::update_page(&mut tx, &updated, page.version_no).await? {
            return Err(AppError::Conflict(
                "The page was changed by someone else. Reload it and try again.".to_string(),
            ));
        }

        let reason = format!("Reverted to revision {}.", history_id);
        self.versions
            .record(&mut tx, &page.id, HistoryType::Changed, Some(&reason), actor, None)
            .await?;
        tx.commit().await?;

        tracing::info!(page_id = %page.id, history_id, actor, "page reverted");
        self.reload(&page.id).await
    }

    /// 쓰기 잠금을 잡은 트랜잭션을 시작합니다.
    /// 다른 쓰기가 진행 중이면 연결의 busy_timeout 동안 기다립니다.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// 어떤 행도 가리키지 않게 된 파일을 지웁니다. 실패는 로그만 남깁니다.
    async fn discard_file(&self, path: &str, message: &'static str) {
        if let Err(e) = self.storage.delete(path).await {
            tracing::error!(path = %path, error = %e, "{}", message);
        }
    }

    async fn reload(&self, id: &str) -> Result<Page, AppError> {
        db::get_page(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Failed to retrieve page {}", id)))
    }

    async fn conflict_with_existing(&self, volume_no: i64, page_no: i64, page_type: PageType) -> AppError {
        match db::find_page(&self.pool, volume_no, page_no, page_type).await {
            Ok(Some(existing)) => page_exists(&existing),
            Ok(None) => AppError::Conflict("The page was created concurrently".to_string()),
            Err(e) => e,
        }
    }
}

fn page_exists(existing: &Page) -> AppError {
    AppError::PageExists {
        page_type: existing.page_type,
        page_no: existing.page_no,
        volume_no: existing.volume_no,
        existing_id: existing.id.clone(),
    }
}
