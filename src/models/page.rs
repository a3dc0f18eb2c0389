//! # 페이지(Page) 모델 정의
//!
//! 도서관의 핵심 엔티티인 페이지와, 페이지를 만들고 고칠 때 쓰는
//! 요청/응답 구조체들을 정의합니다.
//!
//! 페이지는 (권 번호, 쪽 번호, 종류) 세 값으로 식별됩니다.
//! 같은 (권, 쪽)에 스캔본과 타이핑본이 각각 하나씩 있을 수 있습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 페이지 내용의 종류
///
/// 변형(variant) 순서가 곧 정렬 순서입니다. DB에는 "Scanned"/"Typed" 문자열로
/// 저장되고 사전순으로도 Scanned가 Typed보다 앞서므로, `Ord`와 SQL `ORDER BY`가
/// 같은 결과를 냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PageType {
    Scanned,
    Typed,
}

impl PageType {
    /// DB와 API에서 쓰는 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Scanned => "Scanned",
            PageType::Typed => "Typed",
        }
    }

    /// 파일 이름과 업로드 필드 이름에 쓰는 소문자 표현
    pub fn slot_name(&self) -> &'static str {
        match self {
            PageType::Scanned => "scanned",
            PageType::Typed => "typed",
        }
    }

    /// 업로드 가능한 최대 파일 크기 (바이트)
    /// 스캔본은 이미지라서 타이핑본보다 10배 크게 허용합니다.
    pub fn max_upload_size(&self) -> u64 {
        match self {
            PageType::Scanned => 10_240_000,
            PageType::Typed => 1_024_000,
        }
    }

    /// 같은 위치의 반대쪽 종류
    pub fn other(&self) -> PageType {
        match self {
            PageType::Scanned => PageType::Typed,
            PageType::Typed => PageType::Scanned,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = String;

    /// URL 경로의 종류 값("Typed", "scanned" 등)을 파싱합니다. 대소문자는 무시합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scanned" => Ok(PageType::Scanned),
            "typed" => Ok(PageType::Typed),
            other => Err(format!("unknown page type: {}", other)),
        }
    }
}

// sqlx::FromRow의 `try_from = "String"` 속성이 이 구현을 사용합니다.
impl TryFrom<String> for PageType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 페이지 엔티티 — DB의 `pages` 테이블 한 행에 대응합니다.
///
/// `scanned_text`와 `typed_text`에는 저장소 기준 상대 경로가 들어 있고,
/// 둘 중 정확히 하나만 비어 있지 않습니다 (DB CHECK 제약으로도 보장).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    /// 페이지 고유 식별자 (UUIDv7)
    pub id: String,
    pub page_no: i64,
    /// 1 이상 21 이하
    pub volume_no: i64,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub page_type: PageType,
    /// 내용 파일이 바뀔 때마다 1씩 증가 (첫 업로드 = 1)
    pub version_no: i64,
    pub scanned_text: String,
    pub typed_text: String,
    /// 업로드/수정 사유
    pub comments: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Page {
    /// 이 페이지에 묶인 파일의 저장 경로
    pub fn file_path(&self) -> &str {
        match self.page_type {
            PageType::Scanned => &self.scanned_text,
            PageType::Typed => &self.typed_text,
        }
    }

    pub fn key(&self) -> PageKey {
        PageKey {
            volume_no: self.volume_no,
            page_no: self.page_no,
            page_type: self.page_type,
        }
    }
}

/// 상세 조회 URL을 만들 수 있는 페이지 위치 정보
/// 이전/다음 페이지 링크에 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageKey {
    pub volume_no: i64,
    pub page_no: i64,
    #[serde(rename = "type")]
    pub page_type: PageType,
}

/// multipart 요청으로 받은 파일 한 개
#[derive(Clone)]
pub struct Upload {
    /// 클라이언트가 보낸 원래 파일 이름 (확장자만 사용)
    pub file_name: String,
    /// 클라이언트가 선언한 Content-Type
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

// 파일 내용 전체를 로그에 찍지 않도록 Debug를 직접 구현합니다.
impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// 새 페이지 생성 입력 — `POST /api/v1/pages`
#[derive(Debug, Clone, Default)]
pub struct NewPage {
    pub page_no: i64,
    pub volume_no: i64,
    /// None이면 채워진 파일 슬롯으로부터 결정됩니다.
    pub page_type: Option<PageType>,
    pub comments: String,
    pub scanned_text: Option<Upload>,
    pub typed_text: Option<Upload>,
}

/// 페이지 수정 입력 — `PATCH /api/v1/pages/:id`
///
/// 쪽 번호, 권 번호, 그리고 반대쪽 파일 슬롯은 수정할 수 없습니다.
/// 반대쪽 슬롯으로 들어온 파일은 무시됩니다.
#[derive(Debug, Clone, Default)]
pub struct PageChanges {
    /// None = 필드 누락 (변경 안 함)
    pub comments: Option<String>,
    pub scanned_text: Option<Upload>,
    pub typed_text: Option<Upload>,
}

/// 목록 조회 쿼리 파라미터 — `GET /api/v1/pages`
///
/// 숫자 필드도 String으로 받아 직접 검증합니다.
/// 빈 입력칸("volume_no=")이 그대로 넘어오는 경우가 있기 때문입니다.
#[derive(Debug, Default, Deserialize)]
pub struct PageListQuery {
    /// 쪽 번호 범위 식 (예: "5, 10-14, 35")
    pub page_no: Option<String>,
    pub volume_no: Option<String>,
    /// 스태프 전용
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    /// 스태프 전용, 대소문자 무시 부분 일치
    pub comments: Option<String>,
    /// 목록 페이지 번호 (1부터)
    pub page: Option<u32>,
}

/// 목록 한 행 — 스태프용
#[derive(Debug, Serialize)]
pub struct StaffPageRow {
    pub id: String,
    pub page_no: i64,
    pub volume_no: i64,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub version_no: i64,
    pub comments: String,
    pub url: String,
}

/// 목록 한 행 — 일반 사용자용 (내부 메타데이터 없음)
#[derive(Debug, Serialize)]
pub struct PublicPageRow {
    pub page_no: i64,
    pub volume_no: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PageRow {
    Staff(StaffPageRow),
    Public(PublicPageRow),
}

/// 목록 응답
#[derive(Debug, Serialize)]
pub struct PageListResponse {
    pub pages: Vec<PageRow>,
    /// 필터를 통과한 전체 행 수 (페이지네이션 이전)
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// 상세 조회 응답
#[derive(Debug, Serialize)]
pub struct PageDetailResponse {
    #[serde(flatten)]
    pub row: PageRow,
    pub next: Option<PageKey>,
    pub previous: Option<PageKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanned_sorts_before_typed() {
        assert!(PageType::Scanned < PageType::Typed);
        assert!(PageType::Scanned.as_str() < PageType::Typed.as_str());
    }

    #[test]
    fn page_type_parses_case_insensitively() {
        assert_eq!("Typed".parse::<PageType>(), Ok(PageType::Typed));
        assert_eq!("scanned".parse::<PageType>(), Ok(PageType::Scanned));
        assert!("photo".parse::<PageType>().is_err());
    }
}
