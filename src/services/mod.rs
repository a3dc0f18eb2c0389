//! # 서비스 계층
//!
//! 라우트 핸들러와 DB 쿼리 사이의 비즈니스 로직입니다.
//! - `page_store`: 페이지 생성/수정/삭제 (트랜잭션 + 파일 + 이력)
//! - `versioning`: 버전 번호와 변경 사유, 이력 조회
//! - `storage`: 파일 저장 경로 계산과 디스크 입출력
//! - `validation`: 업로드 파일과 입력값 검증
//! - `navigation`: 이전/다음 페이지 탐색
//! - `listing`: 목록/상세 조회 (스태프/일반 사용자 구분)
//! - `page_range`: 쪽 번호 범위 필터 파서
//! - `seed`: 개발용 샘플 페이지 채우기 (`pcdl seed`)

pub mod listing;
pub mod navigation;
pub mod page_range;
pub mod page_store;
pub mod seed;
pub mod storage;
pub mod validation;
pub mod versioning;

pub use page_store::PageStore;
pub use storage::MediaStorage;
pub use versioning::VersionTracker;
