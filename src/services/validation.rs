//! # 업로드 파일과 페이지 입력 검증
//!
//! 저장 전에 실행되는 모든 검증 규칙을 모아둔 모듈입니다.
//! 검증은 DB나 디스크를 건드리기 전에 끝나야 하므로, 여기의 함수들은
//! 모두 순수 함수입니다.

use crate::error::AppError;
use crate::models::{PageType, Upload};

/// 허용하는 문서 MIME 타입
pub const DOCUMENT_CONTENT_TYPES: &[&str] = &["application/pdf"];

pub const MIN_VOLUME_NO: i64 = 1;
pub const MAX_VOLUME_NO: i64 = 21;

/// 업로드 파일 검증기 (크기 + 실제 내용 형식)
#[derive(Debug, Clone, Copy)]
pub struct FileValidator {
    pub max_size: u64,
    pub content_types: &'static [&'static str],
}

impl FileValidator {
    /// 슬롯 종류에 맞는 검증기를 만듭니다.
    pub fn for_slot(page_type: PageType) -> Self {
        Self {
            max_size: page_type.max_upload_size(),
            content_types: DOCUMENT_CONTENT_TYPES,
        }
    }

    pub fn validate(&self, upload: &Upload) -> Result<(), AppError> {
        let size = upload.bytes.len() as u64;
        if size > self.max_size {
            return Err(AppError::Validation(format!(
                "Ensure this file size is not greater than {}. Your file size is {}.",
                filesizeformat(self.max_size),
                filesizeformat(size),
            )));
        }

        let content_type = sniff_content_type(upload);
        if !self.content_types.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Files of type {} are not supported.",
                content_type
            )));
        }
        Ok(())
    }
}

/// 파일 앞부분의 매직 바이트로 MIME 타입을 판별합니다.
///
/// 클라이언트가 선언한 Content-Type은 판별에 쓰지 않습니다.
/// 판별하지 못한 내용(텍스트 파일 등)은 `application/octet-stream`입니다.
pub fn sniff_content_type(upload: &Upload) -> String {
    let sniffed = infer::get(&upload.bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    if let Some(declared) = upload.content_type.as_deref() {
        if !declared.starts_with(sniffed) {
            tracing::debug!(
                file_name = %upload.file_name,
                declared,
                sniffed,
                "declared content type does not match file contents"
            );
        }
    }
    sniffed.to_string()
}

/// 파일 크기를 사람이 읽기 쉬운 형태로 바꿉니다.
/// 예: 12 → "12 bytes", 1024000 → "1000.0 KB", 10240000 → "9.8 MB"
pub fn filesizeformat(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        if bytes == 1 {
            "1 byte".to_string()
        } else {
            format!("{} bytes", bytes)
        }
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.1} GB", b / GB)
    }
}

/// 권 번호가 1..=21 범위인지 확인합니다.
pub fn validate_volume_no(volume_no: i64) -> Result<(), AppError> {
    if volume_no < MIN_VOLUME_NO {
        return Err(AppError::Validation(format!(
            "The volume number must be greater or equal to {}.",
            MIN_VOLUME_NO
        )));
    }
    if volume_no > MAX_VOLUME_NO {
        return Err(AppError::Validation(format!(
            "The volume number must be less or equal to {}.",
            MAX_VOLUME_NO
        )));
    }
    Ok(())
}

/// 어느 파일 슬롯이 채워졌는지로 페이지 종류를 결정합니다.
///
/// 정확히 하나의 슬롯만 채워져 있어야 합니다.
pub fn resolve_type(scanned_present: bool, typed_present: bool) -> Result<PageType, AppError> {
    match (scanned_present, typed_present) {
        (true, false) => Ok(PageType::Scanned),
        (false, true) => Ok(PageType::Typed),
        (false, false) => Err(AppError::Validation(
            "Either scanned or typed text must be uploaded.".to_string(),
        )),
        (true, true) => Err(AppError::Validation(
            "Scanned and typed text cannot be uploaded together.".to_string(),
        )),
    }
}
