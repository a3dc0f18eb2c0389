//! # 쪽 번호 범위 필터 파서
//!
//! 목록 조회의 `page_no` 필터 값("5, 10-14, 35")을 쪽 번호 집합으로 바꿉니다.
//!
//! - 쉼표로 나눈 각 항목은 앞뒤 공백을 제거한 뒤 `^\d+(-\d+)?$` 형식이어야 합니다.
//! - 한 항목이라도 형식이 틀리면 필터 전체가 거부됩니다 (일부만 적용하지 않음).
//! - "a-b"는 a와 b를 모두 포함하는 범위입니다. a > b이면 빈 범위입니다.
//!
//! 큰 범위("1-1000000")를 펼쳐서 메모리에 올리지 않도록, 내부적으로는
//! 겹치는 범위를 병합한 구간 목록으로 보관합니다.

use std::ops::RangeInclusive;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

pub const INVALID_PAGE_FILTER: &str =
    "Values must be a range or separate page numbers. E.g. 5, 10-14, 35";

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(-\d+)?$").expect("valid page range pattern"))
}

/// 파싱된 쪽 번호 집합
///
/// 구간은 시작값 기준으로 정렬되어 있고 서로 겹치거나 이어지지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageNumbers {
    ranges: Vec<RangeInclusive<i64>>,
}

impl PageNumbers {
    pub fn contains(&self, page_no: i64) -> bool {
        self.ranges.iter().any(|r| r.contains(&page_no))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// 병합된 구간들 (SQL `BETWEEN` 조건 생성용)
    pub fn ranges(&self) -> &[RangeInclusive<i64>] {
        &self.ranges
    }

    fn from_ranges(mut ranges: Vec<RangeInclusive<i64>>) -> Self {
        ranges.retain(|r| !r.is_empty());
        ranges.sort_by_key(|r| *r.start());

        let mut merged: Vec<RangeInclusive<i64>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if *range.start() <= last.end().saturating_add(1) => {
                    if range.end() > last.end() {
                        *last = *last.start()..=*range.end();
                    }
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }
}

/// 필터 문자열을 파싱합니다.
///
/// # 반환값
/// - `Ok(None)`: 값이 없거나 비어 있음 → 필터를 적용하지 않음
/// - `Ok(Some(numbers))`: 파싱 성공
/// - `Err(AppError::Validation)`: 형식 오류 (메시지는 항상 동일)
pub fn parse_page_numbers(value: Option<&str>) -> Result<Option<PageNumbers>, AppError> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };

    let invalid = || AppError::Validation(INVALID_PAGE_FILTER.to_string());

    let mut ranges = Vec::new();
    for token in value.split(',') {
        let token = token.trim();
        if !token_pattern().is_match(token) {
            return Err(invalid());
        }
        // 자릿수가 너무 많아 i64에 들어가지 않는 값도 형식 오류로 봅니다.
        let range = match token.split_once('-') {
            Some((start, end)) => {
                let start: i64 = start.parse().map_err(|_| invalid())?;
                let end: i64 = end.parse().map_err(|_| invalid())?;
                start..=end
            }
            None => {
                let n: i64 = token.parse().map_err(|_| invalid())?;
                n..=n
            }
        };
        ranges.push(range);
    }

    Ok(Some(PageNumbers::from_ranges(ranges)))
}
