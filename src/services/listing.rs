//! # 페이지 목록과 상세 조회
//!
//! 조회하는 사람이 스태프인지에 따라 보이는 행과 필드가 달라집니다.
//! - 스태프: 모든 행(중복 포함), 종류/버전/설명 필드, 종류/설명 필터
//! - 일반 사용자: 같은 (권, 쪽)은 한 행만(스캔본 우선), 쪽/권 번호만

use sqlx::SqlitePool;

use crate::db::{self, PageFilter};
use crate::error::AppError;
use crate::models::{
    Page, PageListQuery, PageListResponse, PageRow, PageType, PublicPageRow, StaffPageRow,
};
use crate::services::page_range::parse_page_numbers;
use crate::services::storage::MediaStorage;

/// 목록 한 화면에 보여줄 행 수
pub const PER_PAGE: u32 = 100;

impl PageFilter {
    /// 쿼리 파라미터를 검증해 필터 조건으로 바꿉니다.
    ///
    /// 일반 사용자가 보낸 `type`, `comments` 값은 무시됩니다.
    pub fn from_query(query: &PageListQuery, is_staff: bool) -> Result<Self, AppError> {
        let page_numbers = parse_page_numbers(query.page_no.as_deref())?;
        let volume_no = match non_empty(query.volume_no.as_deref()) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| AppError::Validation("Enter a whole number.".to_string()))?,
            ),
            None => None,
        };

        if !is_staff {
            return Ok(Self {
                page_numbers,
                volume_no,
                page_type: None,
                comments: None,
                collapse_duplicates: true,
            });
        }

        let page_type = match non_empty(query.page_type.as_deref()) {
            Some(raw) => Some(raw.parse::<PageType>().map_err(|_| {
                AppError::Validation(format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    raw
                ))
            })?),
            None => None,
        };

        Ok(Self {
            page_numbers,
            volume_no,
            page_type,
            comments: non_empty(query.comments.as_deref()).map(str::to_string),
            collapse_duplicates: false,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 조회자에게 맞는 목록 행으로 변환합니다.
pub fn page_row(page: Page, storage: &MediaStorage, is_staff: bool) -> PageRow {
    let url = storage.url_for(page.file_path());
    if is_staff {
        PageRow::Staff(StaffPageRow {
            id: page.id,
            page_no: page.page_no,
            volume_no: page.volume_no,
            page_type: page.page_type,
            version_no: page.version_no,
            comments: page.comments,
            url,
        })
    } else {
        PageRow::Public(PublicPageRow {
            page_no: page.page_no,
            volume_no: page.volume_no,
            url,
        })
    }
}

/// 필터를 적용한 목록의 한 화면(100행)을 조회합니다.
///
/// # 에러
/// - `Validation`: 필터 값 형식 오류
/// - `NotFound`: 범위를 벗어난 목록 페이지 번호
pub async fn list_pages(
    pool: &SqlitePool,
    storage: &MediaStorage,
    query: &PageListQuery,
    is_staff: bool,
) -> Result<PageListResponse, AppError> {
    let filter = PageFilter::from_query(query, is_staff)?;
    let page = query.page.unwrap_or(1).max(1);
    let offset = i64::from(page - 1) * i64::from(PER_PAGE);

    let total = db::count_pages(pool, &filter).await?;
    if page > 1 && offset >= total {
        return Err(AppError::NotFound);
    }

    let pages = db::list_pages(pool, &filter, i64::from(PER_PAGE), offset).await?;
    tracing::debug!(total, page, is_staff, "listed pages");

    Ok(PageListResponse {
        pages: pages
            .into_iter()
            .map(|p| page_row(p, storage, is_staff))
            .collect(),
        total,
        page,
        per_page: PER_PAGE,
    })
}

/// 상세 조회 대상 페이지를 찾습니다.
///
/// 일반 사용자는 요청한 종류와 상관없이 스캔본을, 없으면 타이핑본을 봅니다.
/// 스태프는 요청한 종류를 그대로 보며, 종류를 지정하지 않으면 일반 사용자와 같은 규칙입니다.
pub async fn find_detail(
    pool: &SqlitePool,
    volume_no: i64,
    page_no: i64,
    requested_type: Option<&str>,
    is_staff: bool,
) -> Result<Page, AppError> {
    if is_staff {
        if let Some(raw) = requested_type {
            // 알 수 없는 종류는 해당 페이지가 없는 것과 같게 취급합니다.
            let page_type = raw.parse::<PageType>().map_err(|_| AppError::NotFound)?;
            return db::find_page(pool, volume_no, page_no, page_type)
                .await?
                .ok_or(AppError::NotFound);
        }
    }

    if let Some(scanned) = db::find_page(pool, volume_no, page_no, PageType::Scanned).await? {
        return Ok(scanned);
    }
    db::find_page(pool, volume_no, page_no, PageType::Typed)
        .await?
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_pool, seed_page};

    fn query(page_no: Option<&str>) -> PageListQuery {
        PageListQuery {
            page_no: page_no.map(str::to_string),
            ..Default::default()
        }
    }

    async fn seeded() -> SqlitePool {
        let pool = memory_pool().await;
        seed_page(&pool, 12, 23, PageType::Scanned).await;
        seed_page(&pool, 12, 23, PageType::Typed).await;
        seed_page(&pool, 12, 35, PageType::Scanned).await;
        pool
    }

    #[tokio::test]
    async fn regular_listing_collapses_duplicates() {
        let pool = seeded().await;
        let storage = MediaStorage::new("/tmp/unused", "/media/");

        let user = list_pages(&pool, &storage, &query(None), false).await.unwrap();
        assert_eq!(user.total, 2);
        assert_eq!(user.pages.len(), 2);
        assert!(matches!(user.pages[0], PageRow::Public(_)));

        let staff = list_pages(&pool, &storage, &query(None), true).await.unwrap();
        assert_eq!(staff.total, 3);
        assert!(matches!(staff.pages[0], PageRow::Staff(_)));
    }

    #[tokio::test]
    async fn invalid_page_filter_rejects_the_listing() {
        let pool = seeded().await;
        let storage = MediaStorage::new("/tmp/unused", "/media/");
        let err = list_pages(&pool, &storage, &query(Some("22;24")), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn staff_only_filters_are_ignored_for_regular_users() {
        let q = PageListQuery {
            page_type: Some("Typed".to_string()),
            comments: Some("x".to_string()),
            volume_no: Some(" 12 ".to_string()),
            ..Default::default()
        };
        let user = PageFilter::from_query(&q, false).unwrap();
        assert_eq!(user.page_type, None);
        assert_eq!(user.comments, None);
        assert_eq!(user.volume_no, Some(12));
        assert!(user.collapse_duplicates);

        let staff = PageFilter::from_query(&q, true).unwrap();
        assert_eq!(staff.page_type, Some(PageType::Typed));
        assert_eq!(staff.comments.as_deref(), Some("x"));
        assert!(!staff.collapse_duplicates);
    }

    #[test]
    fn malformed_numbers_and_choices_are_validation_errors() {
        let q = PageListQuery {
            volume_no: Some("twelve".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PageFilter::from_query(&q, false),
            Err(AppError::Validation(_))
        ));

        let q = PageListQuery {
            page_type: Some("Photo".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PageFilter::from_query(&q, true),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn listing_pages_past_the_end_is_not_found() {
        let pool = seeded().await;
        let storage = MediaStorage::new("/tmp/unused", "/media/");
        let q = PageListQuery {
            page: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            list_pages(&pool, &storage, &q, true).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn detail_prefers_scanned_for_regular_users() {
        let pool = seeded().await;
        seed_page(&pool, 12, 40, PageType::Typed).await;

        let page = find_detail(&pool, 12, 23, Some("Typed"), false).await.unwrap();
        assert_eq!(page.page_type, PageType::Scanned);

        let page = find_detail(&pool, 12, 40, None, false).await.unwrap();
        assert_eq!(page.page_type, PageType::Typed);

        let page = find_detail(&pool, 12, 23, Some("Typed"), true).await.unwrap();
        assert_eq!(page.page_type, PageType::Typed);

        assert!(matches!(
            find_detail(&pool, 12, 35, Some("Typed"), true).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            find_detail(&pool, 12, 23, Some("photo"), true).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            find_detail(&pool, 3, 3, None, false).await,
            Err(AppError::NotFound)
        ));
    }
}
