//! # 요청자 식별 (JWT)
//!
//! 로그인/회원가입은 외부 인증 제공자가 담당하고, 이 서버는 발급된 토큰만 검증합니다.
//! 토큰의 클레임에 스태프 여부(`is_staff`, `is_superuser`)가 들어 있습니다.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub exp: i64,
    pub iat: i64,
}

/// 인증된 요청자
///
/// 핸들러 인자로 받으면 토큰이 없는 요청은 401로 거절됩니다.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Viewer {
    /// 슈퍼유저도 스태프 화면을 봅니다.
    pub fn is_staff(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    /// 페이지 변경과 이력 조회는 스태프만 할 수 있습니다.
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only staff members can manage pages".to_string(),
            ))
        }
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let claims = verify_token(token, &state.jwt_secret)?;

        Ok(Viewer {
            user_id: claims.sub,
            is_staff: claims.is_staff,
            is_superuser: claims.is_superuser,
        })
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = match err {
            AuthError::MissingToken => "Authorization token is required",
            AuthError::InvalidToken => "Invalid authorization token",
            AuthError::ExpiredToken => "Authorization token has expired",
        };
        AppError::Unauthorized(message.to_string())
    }
}

// 인증 실패도 다른 에러와 같은 `{"error": {...}}` 형태로 내려갑니다.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => {
            tracing::debug!(error = %e, "rejected authorization token");
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// 테스트용 토큰 발급 (실서비스에서는 인증 제공자가 발급)
#[cfg(test)]
pub fn issue_token(user_id: &str, is_staff: bool, secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        is_staff,
        is_superuser: false,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(15)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode test token")
}
