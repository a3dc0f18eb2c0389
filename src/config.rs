//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로
//! - `JWT_SECRET`: 인증 제공자가 발급한 JWT를 검증할 비밀키
//! - `MEDIA_ROOT`: 업로드된 PDF가 저장되는 디렉토리
//! - `MEDIA_URL`: 저장된 파일을 내려받을 때 쓰는 URL 접두사
//! - `HISTORY_REVERT_DISABLED`: 변경 이력 되돌리기 금지 여부
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호

use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 필요한 값만 각 구성 요소에 명시적으로 넘겨줍니다 (전역 상태 없음).
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/pcdl.db")
    pub database_url: String,
    /// JWT 토큰 검증에 사용하는 비밀키
    pub jwt_secret: String,
    /// PDF 파일 저장 루트 디렉토리 (기본값: "data/media")
    pub media_root: String,
    /// 저장된 파일의 URL 접두사 (기본값: "/media/")
    pub media_url: String,
    /// true면 변경 이력을 과거 리비전으로 되돌릴 수 없습니다 (기본값: true)
    pub history_revert_disabled: bool,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "data/media".to_string()),
            media_url: normalize_media_url(
                &env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string()),
            ),
            history_revert_disabled: env::var("HISTORY_REVERT_DISABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        })
    }
}

/// "1", "true", "yes", "on" (대소문자 무시)을 참으로 봅니다.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// URL 접두사가 항상 `/`로 시작하고 끝나도록 맞춥니다.
/// 예: "media" → "/media/"
fn normalize_media_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
