//! # 개발용 샘플 데이터
//!
//! 빈 DB에 페이지를 채워 목록, 중복 제거, 이전/다음 탐색을 손으로 확인할 수 있게 합니다.
//! - 1권 1쪽부터 `paired`쪽까지: 스캔본 + 타이핑본
//! - 2~21권에 흩어진 타이핑본 `scattered`건, 스캔본 `scattered`건
//!
//! 이미 페이지가 있는 DB에서는 실행을 거부합니다.

use crate::db::{self, PageFilter};
use crate::error::AppError;
use crate::models::{NewPage, PageType, Upload};
use crate::services::PageStore;

/// `--pdf`를 주지 않았을 때 쓰는 최소 PDF
pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n";

const SEED_ACTOR: &str = "seed";

#[derive(Debug, Clone, Copy)]
pub struct SeedPlan {
    pub paired: i64,
    pub scattered: i64,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            paired: 25,
            scattered: 250,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    /// 흩어진 위치가 겹쳐 건너뛴 수
    pub skipped: usize,
}

pub async fn populate_pages(
    store: &PageStore,
    plan: SeedPlan,
    pdf: &[u8],
) -> Result<SeedReport, AppError> {
    if db::count_pages(store.pool(), &PageFilter::default()).await? > 0 {
        return Err(AppError::Conflict(
            "The catalogue already has pages; seeding only runs on an empty database.".to_string(),
        ));
    }

    let mut report = SeedReport::default();
    for page_no in 1..=plan.paired {
        for page_type in [PageType::Typed, PageType::Scanned] {
            seed_one(store, 1, page_no, page_type, pdf, &mut report).await?;
        }
    }

    // 2~21권, 1~500쪽 범위에 고르게 흩뿌립니다. 같은 입력이면 항상 같은 위치입니다.
    for i in 0..plan.scattered {
        let typed = ((i * 7919) % 500 + 1, 2 + (i * 31) % 20);
        let scanned = ((i * 104_729) % 500 + 1, 2 + (i * 17) % 20);
        seed_one(store, typed.1, typed.0, PageType::Typed, pdf, &mut report).await?;
        seed_one(store, scanned.1, scanned.0, PageType::Scanned, pdf, &mut report).await?;
    }

    tracing::info!(created = report.created, skipped = report.skipped, "seeded pages");
    Ok(report)
}

async fn seed_one(
    store: &PageStore,
    volume_no: i64,
    page_no: i64,
    page_type: PageType,
    pdf: &[u8],
    report: &mut SeedReport,
) -> Result<(), AppError> {
    let upload = Some(Upload {
        file_name: "sample.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: pdf.to_vec(),
    });
    let (scanned_text, typed_text) = match page_type {
        PageType::Scanned => (upload, None),
        PageType::Typed => (None, upload),
    };
    let new_page = NewPage {
        page_no,
        volume_no,
        page_type: Some(page_type),
        comments: String::new(),
        scanned_text,
        typed_text,
    };

    match store.create(new_page, SEED_ACTOR).await {
        Ok(_) => report.created += 1,
        Err(AppError::PageExists { .. }) => report.skipped += 1,
        Err(e) => return Err(e),
    }
    Ok(())
}
