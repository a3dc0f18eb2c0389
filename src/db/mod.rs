//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스(services/)와 라우트 핸들러(routes/)가 이 모듈의 함수를 호출합니다.
//!
//! 각 하위 모듈:
//! - `pages`: 페이지 CRUD, 목록 필터, 이전/다음 탐색 쿼리
//! - `history`: 변경 이력 기록/조회 쿼리

pub mod history;
pub mod pages;

pub use history::*;
pub use pages::*;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// 쓰기 잠금을 기다리는 최대 시간
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// 파일 기반 SQLite 연결 풀을 만듭니다. DB 파일이 없으면 새로 만듭니다.
///
/// 쓰기 트랜잭션끼리는 `BEGIN IMMEDIATE`에서 잠금이 풀릴 때까지 기다리므로
/// busy_timeout이 동시 업로드의 대기 한도가 됩니다.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}
