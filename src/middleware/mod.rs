//! # 요청 전처리
//!
//! - `auth`: Authorization 헤더의 JWT로 요청자(`Viewer`)를 식별

pub mod auth;
