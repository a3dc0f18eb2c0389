//! # 이전/다음 페이지 탐색
//!
//! (권, 쪽, 종류) 순서로 전체 컬렉션을 따라 이동합니다.
//! 매 호출마다 현재 DB 내용으로 계산하며 상태를 갖지 않습니다.
//! 컬렉션의 처음/끝에서는 에러 없이 `None`을 반환합니다.
//!
//! 스태프와 일반 사용자의 동작이 다릅니다:
//! - 스태프는 같은 쪽의 반대 종류(스캔본 → 타이핑본, 타이핑본 → 스캔본)를
//!   먼저 보여준 뒤 다음 쪽으로 넘어갑니다.
//! - 일반 사용자가 뒤로 갈 때는 같은 쪽에 두 종류가 있으면 스캔본에 멈춥니다
//!   (목록에서 보이는 쪽이 스캔본이기 때문).
//!   스태프가 뒤로 갈 때는 종류 정렬 없이 정렬 순서상 마지막 행(타이핑본)에 멈춥니다.

use sqlx::SqlitePool;

use crate::db::{self, TypeTieBreak};
use crate::error::AppError;
use crate::models::{Page, PageType};

/// 다음 페이지를 찾습니다.
pub async fn find_next(
    pool: &SqlitePool,
    page: &Page,
    is_staff: bool,
) -> Result<Option<Page>, AppError> {
    if is_staff && page.page_type == PageType::Scanned {
        if let Some(typed) =
            db::find_page(pool, page.volume_no, page.page_no, PageType::Typed).await?
        {
            return Ok(Some(typed));
        }
    }

    if let Some(next) = db::first_after_in_volume(pool, page.volume_no, page.page_no).await? {
        return Ok(Some(next));
    }
    db::first_in_later_volume(pool, page.volume_no).await
}

/// 이전 페이지를 찾습니다.
pub async fn find_previous(
    pool: &SqlitePool,
    page: &Page,
    is_staff: bool,
) -> Result<Option<Page>, AppError> {
    if is_staff && page.page_type == PageType::Typed {
        if let Some(scanned) =
            db::find_page(pool, page.volume_no, page.page_no, PageType::Scanned).await?
        {
            return Ok(Some(scanned));
        }
    }

    // TODO: 제품 담당자와 확인 후 스태프/일반 사용자의 동점 처리 규칙을 하나로 맞출지 결정
    let tie_break = if is_staff {
        TypeTieBreak::Natural
    } else {
        TypeTieBreak::PreferScanned
    };

    if let Some(previous) =
        db::last_before_in_volume(pool, page.volume_no, page.page_no, tie_break).await?
    {
        return Ok(Some(previous));
    }
    db::last_in_earlier_volume(pool, page.volume_no, tie_break).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_pool, seed_page};

    fn key(page: Option<Page>) -> Option<(i64, i64, PageType)> {
        page.map(|p| (p.volume_no, p.page_no, p.page_type))
    }

    /// 12권 23쪽(스캔+타이핑), 12권 35쪽(스캔), 14권 36쪽(스캔)
    async fn seeded() -> (SqlitePool, Vec<Page>) {
        let pool = memory_pool().await;
        let pages = vec![
            seed_page(&pool, 12, 23, PageType::Scanned).await,
            seed_page(&pool, 12, 23, PageType::Typed).await,
            seed_page(&pool, 12, 35, PageType::Scanned).await,
            seed_page(&pool, 14, 36, PageType::Scanned).await,
        ];
        (pool, pages)
    }

    #[tokio::test]
    async fn staff_see_the_typed_sibling_before_moving_on() {
        let (pool, pages) = seeded().await;
        let next = find_next(&pool, &pages[0], true).await.unwrap();
        assert_eq!(key(next), Some((12, 23, PageType::Typed)));

        let next = find_next(&pool, &pages[1], true).await.unwrap();
        assert_eq!(key(next), Some((12, 35, PageType::Scanned)));
    }

    #[tokio::test]
    async fn regular_users_skip_the_duplicate() {
        let (pool, pages) = seeded().await;
        let next = find_next(&pool, &pages[0], false).await.unwrap();
        assert_eq!(key(next), Some((12, 35, PageType::Scanned)));
    }

    #[tokio::test]
    async fn next_crosses_into_the_following_volume() {
        let (pool, pages) = seeded().await;
        let next = find_next(&pool, &pages[2], false).await.unwrap();
        assert_eq!(key(next), Some((14, 36, PageType::Scanned)));
    }

    #[tokio::test]
    async fn collection_boundaries_return_nothing() {
        let (pool, pages) = seeded().await;
        assert!(find_next(&pool, &pages[3], true).await.unwrap().is_none());
        assert!(find_next(&pool, &pages[3], false).await.unwrap().is_none());
        assert!(find_previous(&pool, &pages[0], true).await.unwrap().is_none());
        assert!(find_previous(&pool, &pages[0], false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stepping_back_over_a_duplicate_depends_on_the_viewer() {
        let (pool, pages) = seeded().await;

        let previous = find_previous(&pool, &pages[2], false).await.unwrap();
        assert_eq!(key(previous), Some((12, 23, PageType::Scanned)));

        let previous = find_previous(&pool, &pages[2], true).await.unwrap();
        assert_eq!(key(previous), Some((12, 23, PageType::Typed)));

        // 스태프가 타이핑본에 있으면 같은 쪽의 스캔본이 먼저입니다.
        let previous = find_previous(&pool, &pages[1], true).await.unwrap();
        assert_eq!(key(previous), Some((12, 23, PageType::Scanned)));
    }

    #[tokio::test]
    async fn previous_crosses_into_the_preceding_volume() {
        let (pool, pages) = seeded().await;
        let previous = find_previous(&pool, &pages[3], false).await.unwrap();
        assert_eq!(key(previous), Some((12, 35, PageType::Scanned)));

        seed_page(&pool, 13, 1, PageType::Typed).await;
        seed_page(&pool, 13, 1, PageType::Scanned).await;
        let previous = find_previous(&pool, &pages[3], false).await.unwrap();
        assert_eq!(key(previous), Some((13, 1, PageType::Scanned)));
        let previous = find_previous(&pool, &pages[3], true).await.unwrap();
        assert_eq!(key(previous), Some((13, 1, PageType::Typed)));
    }
}
