//! # pcdl 웹 서버 진입점
//!
//! Peling Chhokhor 디지털 도서관의 페이지 카탈로그 서버입니다.
//! 권/쪽 번호로 정리된 스캔본과 타이핑본 PDF를 올리고, 찾아보고, 변경 이력을 남깁니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성과 마이그레이션
//! 4. 미디어 저장 디렉토리 생성
//! 5. API 라우터 + 미디어 파일 서빙 설정
//! 6. HTTP 서버 시작
//!
//! `pcdl seed`는 서버 대신 빈 DB에 개발용 샘플 페이지를 채우고 종료합니다.

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use axum::Router;
use clap::{Parser, Subcommand};
use config::Config;
use routes::AppState;
use services::{MediaStorage, PageStore, VersionTracker};
use std::path::{Path, PathBuf};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pcdl", version, about = "Peling Chhokhor digital library page catalogue")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Fill an empty database with sample pages for development
    Seed {
        /// PDF file to upload for every sample page
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pcdl=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url, 5).await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    let media_root = Path::new(&config.media_root);
    if !media_root.exists() {
        tokio::fs::create_dir_all(media_root).await?;
        tracing::info!("Created media directory: {}", config.media_root);
    }

    let store = PageStore::new(
        pool,
        MediaStorage::new(&config.media_root, config.media_url.clone()),
        VersionTracker::new(config.history_revert_disabled),
    );
    if config.history_revert_disabled {
        tracing::info!("History revert is disabled");
    }

    if let Some(Command::Seed { pdf }) = cli.command {
        let pdf = match pdf {
            Some(path) => tokio::fs::read(&path).await?,
            None => services::seed::SAMPLE_PDF.to_vec(),
        };
        let report =
            services::seed::populate_pages(&store, services::seed::SeedPlan::default(), &pdf)
                .await?;
        tracing::info!(created = report.created, skipped = report.skipped, "seed finished");
        return Ok(());
    }

    tracing::info!("Starting pcdl server on {}:{}", config.host, config.port);
    let state = AppState {
        store,
        jwt_secret: config.jwt_secret.clone(),
    };

    // 개발 환경 기준으로 모든 출처를 허용합니다. 운영에서는 프록시(Caddy)에서 제한합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 저장된 PDF는 MEDIA_URL 아래에서 읽기 전용으로 내려줍니다.
    let media_mount = config.media_url.trim_end_matches('/');
    let app = if media_mount.is_empty() {
        tracing::warn!("MEDIA_URL is \"/\"; stored documents are not served by this process");
        Router::new().nest("/api/v1", routes::api_router(state))
    } else {
        Router::new()
            .nest("/api/v1", routes::api_router(state))
            .nest_service(media_mount, ServeDir::new(&config.media_root))
    }
    .layer(cors)
    .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
