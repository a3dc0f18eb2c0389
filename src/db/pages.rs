//! # 페이지 데이터베이스 쿼리 모듈
//!
//! `pages` 테이블에 대한 조회/삽입/수정/삭제 쿼리와, 목록 필터링 및
//! 이전/다음 페이지 탐색에 쓰이는 쿼리들이 정의되어 있습니다.
//!
//! 정렬 기준은 어디서나 (권 번호, 쪽 번호, 종류) 오름차순입니다.
//! 종류는 문자열 사전순이므로 같은 위치에서는 Scanned가 Typed보다 앞섭니다.
//!
//! 트랜잭션 안팎에서 모두 쓰이는 함수는 `sqlx::Executor`를 제네릭으로 받습니다.
//! `&SqlitePool`도, 트랜잭션의 `&mut *tx`도 넘길 수 있습니다.

use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{Page, PageType};
use crate::services::page_range::PageNumbers;

/// ID로 단일 페이지를 조회합니다.
pub async fn get_page<'e, E>(executor: E, id: &str) -> Result<Option<Page>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, page_no, volume_no, page_type, version_no,
               scanned_text, typed_text, comments, created_at, updated_at
        FROM pages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(page)
}

/// (권, 쪽, 종류)로 페이지를 조회합니다. 유일 제약 때문에 최대 한 건입니다.
pub async fn find_page<'e, E>(
    executor: E,
    volume_no: i64,
    page_no: i64,
    page_type: PageType,
) -> Result<Option<Page>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, page_no, volume_no, page_type, version_no,
               scanned_text, typed_text, comments, created_at, updated_at
        FROM pages
        WHERE volume_no = ? AND page_no = ? AND page_type = ?
        "#,
    )
    .bind(volume_no)
    .bind(page_no)
    .bind(page_type.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(page)
}

/// 새 페이지 행을 삽입합니다.
///
/// 같은 (권, 쪽, 종류)가 이미 있으면 UNIQUE 제약 위반 에러가 그대로 반환됩니다.
/// 호출하는 쪽에서 `AppError::is_unique_violation()`으로 구분합니다.
pub async fn insert_page(conn: &mut SqliteConnection, page: &Page) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO pages (id, page_no, volume_no, page_type, version_no,
                           scanned_text, typed_text, comments)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&page.id)
    .bind(page.page_no)
    .bind(page.volume_no)
    .bind(page.page_type.as_str())
    .bind(page.version_no)
    .bind(&page.scanned_text)
    .bind(&page.typed_text)
    .bind(&page.comments)
    .execute(conn)
    .await?;

    Ok(())
}

/// 수정 가능한 필드(버전, 파일 경로, 설명)를 저장합니다.
///
/// 쪽 번호, 권 번호, 종류는 한 번 만들어지면 바뀌지 않으므로 건드리지 않습니다.
/// `expected_version`은 낙관적 잠금입니다. 그 사이 다른 사용자가 버전을 올렸으면
/// 0행이 수정되고 `Ok(false)`를 반환합니다.
pub async fn update_page(
    conn: &mut SqliteConnection,
    page: &Page,
    expected_version: i64,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE pages
        SET version_no = ?, scanned_text = ?, typed_text = ?, comments = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND version_no = ?
        "#,
    )
    .bind(page.version_no)
    .bind(&page.scanned_text)
    .bind(&page.typed_text)
    .bind(&page.comments)
    .bind(&page.id)
    .bind(expected_version)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 페이지 행을 삭제합니다.
pub async fn delete_page(conn: &mut SqliteConnection, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM pages WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ── 목록 필터링 ──

/// 목록 조회 조건
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFilter {
    /// 쪽 번호 집합 (범위 식에서 파싱됨)
    pub page_numbers: Option<PageNumbers>,
    pub volume_no: Option<i64>,
    pub page_type: Option<PageType>,
    /// 대소문자 무시 부분 일치
    pub comments: Option<String>,
    /// true면 같은 (권, 쪽)의 중복 행을 하나로 줄입니다 (일반 사용자 목록).
    pub collapse_duplicates: bool,
}

/// LIKE 패턴의 특수 문자(%, _, \)를 이스케이프합니다.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `SELECT ... FROM pages p` 뒤에 WHERE 절을 붙인 쿼리 빌더를 만듭니다.
///
/// 중복 제거: 스캔본 집합 S와 타이핑본 집합 T가 있을 때 결과는
/// S ∪ { t ∈ T : 같은 (권, 쪽)의 스캔본이 S에 없음 } 입니다.
/// 일반 사용자 목록에는 쪽/권 필터만 있고, 같은 (권, 쪽)의 스캔본은 그 필터를
/// 똑같이 통과하므로 하위 쿼리에 필터를 다시 적용할 필요가 없습니다.
fn filtered_query<'a>(select: &str, filter: &PageFilter) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(select);
    builder.push(" FROM pages p WHERE 1 = 1");

    if let Some(numbers) = &filter.page_numbers {
        if numbers.is_empty() {
            builder.push(" AND 0");
        } else {
            builder.push(" AND (");
            for (i, range) in numbers.ranges().iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push("p.page_no BETWEEN ")
                    .push_bind(*range.start())
                    .push(" AND ")
                    .push_bind(*range.end());
            }
            builder.push(")");
        }
    }

    if let Some(volume_no) = filter.volume_no {
        builder.push(" AND p.volume_no = ").push_bind(volume_no);
    }

    if let Some(page_type) = filter.page_type {
        builder.push(" AND p.page_type = ").push_bind(page_type.as_str());
    }

    if let Some(comments) = &filter.comments {
        builder
            .push(" AND p.comments LIKE ")
            .push_bind(like_pattern(comments))
            .push(" ESCAPE '\\'");
    }

    if filter.collapse_duplicates {
        builder.push(
            " AND (p.page_type = 'Scanned' OR NOT EXISTS (\
               SELECT 1 FROM pages s \
               WHERE s.volume_no = p.volume_no AND s.page_no = p.page_no \
                 AND s.page_type = 'Scanned'))",
        );
    }

    builder
}

/// 조건에 맞는 페이지 수를 셉니다.
pub async fn count_pages(pool: &SqlitePool, filter: &PageFilter) -> Result<i64, AppError> {
    let mut builder = filtered_query("SELECT COUNT(*)", filter);
    let total = builder.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(total)
}

/// 조건에 맞는 페이지를 정렬 순서대로 `limit`개 조회합니다.
pub async fn list_pages(
    pool: &SqlitePool,
    filter: &PageFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Page>, AppError> {
    let mut builder = filtered_query(
        "SELECT p.id, p.page_no, p.volume_no, p.page_type, p.version_no, \
         p.scanned_text, p.typed_text, p.comments, p.created_at, p.updated_at",
        filter,
    );
    builder
        .push(" ORDER BY p.volume_no, p.page_no, p.page_type LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let pages = builder.build_query_as::<Page>().fetch_all(pool).await?;
    Ok(pages)
}

// ── 이전/다음 페이지 탐색 ──

/// 같은 권에서 쪽 번호가 더 큰 첫 페이지
pub async fn first_after_in_volume(
    pool: &SqlitePool,
    volume_no: i64,
    page_no: i64,
) -> Result<Option<Page>, AppError> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, page_no, volume_no, page_type, version_no,
               scanned_text, typed_text, comments, created_at, updated_at
        FROM pages
        WHERE volume_no = ? AND page_no > ?
        ORDER BY page_no, page_type
        LIMIT 1
        "#,
    )
    .bind(volume_no)
    .bind(page_no)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}

/// 권 번호가 더 큰 권들 중 첫 페이지
pub async fn first_in_later_volume(
    pool: &SqlitePool,
    volume_no: i64,
) -> Result<Option<Page>, AppError> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        SELECT id, page_no, volume_no, page_type, version_no,
               scanned_text, typed_text, comments, created_at, updated_at
        FROM pages
        WHERE volume_no > ?
        ORDER BY volume_no, page_no, page_type
        LIMIT 1
        "#,
    )
    .bind(volume_no)
    .fetch_optional(pool)
    .await?;

    Ok(page)
}

/// 같은 쪽에 두 종류가 모두 있을 때 어느 쪽을 "마지막"으로 볼지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTieBreak {
    /// 정렬 순서 그대로의 마지막 → Typed
    Natural,
    /// 종류를 내림차순으로 정렬한 뒤의 마지막 → Scanned
    PreferScanned,
}

/// 같은 권에서 쪽 번호가 더 작은 마지막 페이지
pub async fn last_before_in_volume(
    pool: &SqlitePool,
    volume_no: i64,
    page_no: i64,
    tie_break: TypeTieBreak,
) -> Result<Option<Page>, AppError> {
    let sql = match tie_break {
        TypeTieBreak::Natural => {
            r#"
            SELECT id, page_no, volume_no, page_type, version_no,
                   scanned_text, typed_text, comments, created_at, updated_at
            FROM pages
            WHERE volume_no = ? AND page_no < ?
            ORDER BY page_no DESC, page_type DESC
            LIMIT 1
            "#
        }
        TypeTieBreak::PreferScanned => {
            r#"
            SELECT id, page_no, volume_no, page_type, version_no,
                   scanned_text, typed_text, comments, created_at, updated_at
            FROM pages
            WHERE volume_no = ? AND page_no < ?
            ORDER BY page_no DESC, page_type ASC
            LIMIT 1
            "#
        }
    };

    let page = sqlx::query_as::<_, Page>(sql)
        .bind(volume_no)
        .bind(page_no)
        .fetch_optional(pool)
        .await?;

    Ok(page)
}

/// 권 번호가 더 작은 권들 중 마지막 페이지
pub async fn last_in_earlier_volume(
    pool: &SqlitePool,
    volume_no: i64,
    tie_break: TypeTieBreak,
) -> Result<Option<Page>, AppError> {
    let sql = match tie_break {
        TypeTieBreak::Natural => {
            r#"
            SELECT id, page_no, volume_no, page_type, version_no,
                   scanned_text, typed_text, comments, created_at, updated_at
            FROM pages
            WHERE volume_no < ?
            ORDER BY volume_no DESC, page_no DESC, page_type DESC
            LIMIT 1
            "#
        }
        TypeTieBreak::PreferScanned => {
            r#"
            SELECT id, page_no, volume_no, page_type, version_no,
                   scanned_text, typed_text, comments, created_at, updated_at
            FROM pages
            WHERE volume_no < ?
            ORDER BY volume_no DESC, page_no DESC, page_type ASC
            LIMIT 1
            "#
        }
    };

    let page = sqlx::query_as::<_, Page>(sql)
        .bind(volume_no)
        .fetch_optional(pool)
        .await?;

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::page_range::parse_page_numbers;
    use crate::test_support::{memory_pool, seed_page};

    /// 12권 23쪽(스캔+타이핑), 12권 35쪽(스캔), 14권 36쪽(스캔)
    async fn seeded() -> SqlitePool {
        let pool = memory_pool().await;
        seed_page(&pool, 12, 23, PageType::Scanned).await;
        seed_page(&pool, 12, 23, PageType::Typed).await;
        seed_page(&pool, 12, 35, PageType::Scanned).await;
        seed_page(&pool, 14, 36, PageType::Scanned).await;
        pool
    }

    #[tokio::test]
    async fn staff_filter_sees_every_row() {
        let pool = seeded().await;
        let filter = PageFilter::default();
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 4);

        let pages = list_pages(&pool, &filter, 100, 0).await.unwrap();
        let keys: Vec<_> = pages.iter().map(|p| (p.volume_no, p.page_no, p.page_type)).collect();
        assert_eq!(
            keys,
            vec![
                (12, 23, PageType::Scanned),
                (12, 23, PageType::Typed),
                (12, 35, PageType::Scanned),
                (14, 36, PageType::Scanned),
            ]
        );
    }

    #[tokio::test]
    async fn collapsing_keeps_the_scanned_duplicate() {
        let pool = seeded().await;
        let filter = PageFilter {
            volume_no: Some(12),
            collapse_duplicates: true,
            ..Default::default()
        };
        let pages = list_pages(&pool, &filter, 100, 0).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.page_type == PageType::Scanned));

        let staff = PageFilter {
            volume_no: Some(12),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &staff).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn typed_only_locations_survive_collapsing() {
        let pool = seeded().await;
        seed_page(&pool, 12, 40, PageType::Typed).await;
        let filter = PageFilter {
            collapse_duplicates: true,
            ..Default::default()
        };
        let pages = list_pages(&pool, &filter, 100, 0).await.unwrap();
        assert_eq!(pages.len(), 4);
        assert!(pages
            .iter()
            .any(|p| p.page_no == 40 && p.page_type == PageType::Typed));
    }

    #[tokio::test]
    async fn page_number_ranges_filter_rows() {
        let pool = seeded().await;
        let filter = PageFilter {
            page_numbers: parse_page_numbers(Some("23-35")).unwrap(),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 3);

        let filter = PageFilter {
            page_numbers: parse_page_numbers(Some("36, 1-5")).unwrap(),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 1);

        let filter = PageFilter {
            page_numbers: parse_page_numbers(Some("40-30")).unwrap(),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn comments_match_case_insensitively_and_literally() {
        let pool = seeded().await;
        let page = find_page(&pool, 12, 35, PageType::Scanned).await.unwrap().unwrap();
        sqlx::query("UPDATE pages SET comments = 'Fixed 100% of the Smudges' WHERE id = ?")
            .bind(&page.id)
            .execute(&pool)
            .await
            .unwrap();

        let filter = PageFilter {
            comments: Some("smudges".to_string()),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 1);

        let filter = PageFilter {
            comments: Some("100%".to_string()),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 1);

        let filter = PageFilter {
            comments: Some("1_0".to_string()),
            ..Default::default()
        };
        assert_eq!(count_pages(&pool, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn schema_rejects_rows_with_both_or_no_files() {
        let pool = memory_pool().await;
        let both = sqlx::query(
            "INSERT INTO pages (id, page_no, volume_no, page_type, scanned_text, typed_text) \
             VALUES ('a', 1, 1, 'Typed', 'x.pdf', 'y.pdf')",
        )
        .execute(&pool)
        .await;
        assert!(both.is_err());

        let none = sqlx::query(
            "INSERT INTO pages (id, page_no, volume_no, page_type) VALUES ('b', 1, 1, 'Typed')",
        )
        .execute(&pool)
        .await;
        assert!(none.is_err());

        let bad_volume = sqlx::query(
            "INSERT INTO pages (id, page_no, volume_no, page_type, typed_text) \
             VALUES ('c', 1, 22, 'Typed', 'y.pdf')",
        )
        .execute(&pool)
        .await;
        assert!(bad_volume.is_err());
    }
}
