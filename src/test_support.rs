//! 테스트 공용 도우미
//!
//! 메모리 SQLite 풀, 고정 페이지 행, 임시 미디어 디렉토리를 만듭니다.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::db;
use crate::models::{Page, PageType, Upload};
use crate::services::{MediaStorage, PageStore, VersionTracker};

/// 마이그레이션이 적용된 메모리 DB
///
/// `sqlite::memory:`는 연결마다 다른 DB가 되므로 연결을 하나로 고정하고
/// 유휴 연결이 닫히지 않게 합니다.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

/// 서버와 같은 설정(연결 5개, WAL, busy_timeout)의 파일 DB
///
/// 동시 쓰기 테스트용입니다. 메모리 DB는 연결이 하나라 경쟁이 생기지 않습니다.
pub async fn file_pool(dir: &std::path::Path) -> SqlitePool {
    let url = format!("sqlite://{}", dir.join("pcdl.db").display());
    let pool = db::connect(&url, 5).await.expect("file sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

/// 파일 없이 행만 직접 넣습니다. 이력은 남기지 않습니다.
pub async fn seed_page(pool: &SqlitePool, volume_no: i64, page_no: i64, page_type: PageType) -> Page {
    let path = format!(
        "volume_{v}/page_{p}/volume_{v}_page_{p}_{slot}.pdf",
        v = volume_no,
        p = page_no,
        slot = page_type.slot_name()
    );
    let page = Page {
        id: uuid::Uuid::now_v7().to_string(),
        page_no,
        volume_no,
        page_type,
        version_no: 1,
        scanned_text: if page_type == PageType::Scanned { path.clone() } else { String::new() },
        typed_text: if page_type == PageType::Typed { path } else { String::new() },
        comments: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
    };

    let mut conn = pool.acquire().await.expect("connection");
    db::insert_page(&mut conn, &page).await.expect("seed page");
    drop(conn);

    db::get_page(pool, &page.id)
        .await
        .expect("reload seeded page")
        .expect("seeded page exists")
}

/// PDF 매직 바이트로 시작하는 업로드
pub fn pdf_upload(file_name: &str, body: &str) -> Upload {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.extend_from_slice(body.as_bytes());
    Upload {
        file_name: file_name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes,
    }
}

/// 임시 미디어 디렉토리를 쓰는 PageStore
///
/// TempDir이 drop되면 디렉토리가 지워지므로 테스트가 끝날 때까지 들고 있어야 합니다.
pub async fn page_store(revert_disabled: bool) -> (PageStore, TempDir) {
    let media = tempfile::tempdir().expect("temp media root");
    let store = PageStore::new(
        memory_pool().await,
        MediaStorage::new(media.path(), "/media/"),
        VersionTracker::new(revert_disabled),
    );
    (store, media)
}

/// 디렉토리 아래 파일 수 (하위 디렉토리 포함)
pub fn count_files(dir: &std::path::Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
