//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `page`: 페이지(Page)와 요청/응답 구조체
//! - `history`: 페이지 변경 이력
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Page`처럼 짧게 접근합니다.

pub mod history;
pub mod page;

pub use history::*;
pub use page::*;
