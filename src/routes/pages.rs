//! # 페이지(Page) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/pages`                                    → 목록 (필터, 100행 단위)
//! - `POST   /api/v1/pages`                                    → 새 페이지 업로드 (스태프)
//! - `GET    /api/v1/volumes/{volume_no}/pages/{page_no}`      → 상세 + 이전/다음
//! - `GET    /api/v1/volumes/{volume_no}/pages/{page_no}/{type}`
//! - `PATCH  /api/v1/pages/{id}`                               → 설명/파일 수정 (스태프)
//! - `DELETE /api/v1/pages/{id}`                               → 삭제 (스태프)
//!
//! 생성과 수정은 `multipart/form-data`로 받습니다.
//! 필드: `page_no`, `volume_no`, `type`, `comments`, `scanned_text`(파일), `typed_text`(파일)

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    middleware::auth::Viewer,
    models::*,
    services::{listing, navigation, PageStore},
};

/// 애플리케이션 공유 상태
///
/// PageStore 안에 DB 풀과 파일 저장소가 함께 들어 있습니다.
/// 둘 다 내부적으로 Arc/PathBuf라서 요청마다 clone해도 비용이 작습니다.
#[derive(Clone)]
pub struct AppState {
    pub store: PageStore,
    /// 인증 제공자의 JWT 서명 검증용 비밀키
    pub jwt_secret: String,
}

/// multipart 폼에서 읽어 들인 값
///
/// 숫자 필드는 문자열 그대로 두고, 생성/수정 핸들러가 필요한 것만 검증합니다.
#[derive(Debug, Default)]
struct PageForm {
    page_no: Option<String>,
    volume_no: Option<String>,
    page_type: Option<String>,
    comments: Option<String>,
    scanned_text: Option<Upload>,
    typed_text: Option<Upload>,
}

async fn read_page_form(mut multipart: Multipart) -> Result<PageForm, AppError> {
    let mut form = PageForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "scanned_text" | "typed_text" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(invalid_body)?;
                // 브라우저는 선택하지 않은 파일 입력도 빈 파트로 보냅니다.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let upload = Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
                if name == "scanned_text" {
                    form.scanned_text = Some(upload);
                } else {
                    form.typed_text = Some(upload);
                }
            }
            "page_no" | "volume_no" | "type" | "comments" => {
                let value = field.text().await.map_err(invalid_body)?;
                match name.as_str() {
                    "page_no" => form.page_no = Some(value),
                    "volume_no" => form.volume_no = Some(value),
                    "type" => form.page_type = Some(value),
                    _ => form.comments = Some(value),
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn invalid_body(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

/// 필수 정수 필드를 파싱합니다.
fn required_number(value: Option<&str>, field: &str) -> Result<i64, AppError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        AppError::Validation(format!("{}: This field is required.", field))
    })?;
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("{}: Enter a whole number.", field)))
}

/// `GET /pages` — 필터를 적용한 페이지 목록
pub async fn list_pages(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<PageListQuery>,
) -> Result<Json<PageListResponse>, AppError> {
    let response = listing::list_pages(
        state.store.pool(),
        state.store.storage(),
        &query,
        viewer.is_staff(),
    )
    .await?;
    Ok(Json(response))
}

/// `GET /volumes/{volume_no}/pages/{page_no}` — 종류는 자동 선택 (스캔본 우선)
pub async fn get_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((volume_no, page_no)): Path<(i64, i64)>,
) -> Result<Json<PageDetailResponse>, AppError> {
    page_detail(&state, &viewer, volume_no, page_no, None).await
}

/// `GET /volumes/{volume_no}/pages/{page_no}/{type}` — 종류 지정은 스태프에게만 적용
pub async fn get_page_of_type(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((volume_no, page_no, page_type)): Path<(i64, i64, String)>,
) -> Result<Json<PageDetailResponse>, AppError> {
    page_detail(&state, &viewer, volume_no, page_no, Some(&page_type)).await
}

async fn page_detail(
    state: &AppState,
    viewer: &Viewer,
    volume_no: i64,
    page_no: i64,
    requested_type: Option<&str>,
) -> Result<Json<PageDetailResponse>, AppError> {
    let pool = state.store.pool();
    let is_staff = viewer.is_staff();

    let page = listing::find_detail(pool, volume_no, page_no, requested_type, is_staff).await?;
    let next = navigation::find_next(pool, &page, is_staff).await?;
    let previous = navigation::find_previous(pool, &page, is_staff).await?;

    Ok(Json(PageDetailResponse {
        row: listing::page_row(page, state.store.storage(), is_staff),
        next: next.map(|p| p.key()),
        previous: previous.map(|p| p.key()),
    }))
}

/// `POST /pages` — 새 페이지 업로드
///
/// 스캔본 또는 타이핑본 파일 중 정확히 하나가 있어야 합니다.
/// 같은 (권, 쪽, 종류)가 이미 있으면 409와 함께 기존 페이지 ID를 돌려줍니다.
pub async fn create_page(
    State(state): State<AppState>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Page>), AppError> {
    viewer.require_staff()?;
    let form = read_page_form(multipart).await?;

    let page_type = match form.page_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<PageType>().map_err(|_| {
            AppError::Validation(format!(
                "Select a valid choice. {} is not one of the available choices.",
                raw
            ))
        })?),
    };

    let new_page = NewPage {
        page_no: required_number(form.page_no.as_deref(), "page_no")?,
        volume_no: required_number(form.volume_no.as_deref(), "volume_no")?,
        page_type,
        comments: form.comments.unwrap_or_default(),
        scanned_text: form.scanned_text,
        typed_text: form.typed_text,
    };

    let page = state.store.create(new_page, &viewer.user_id).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

/// `PATCH /pages/{id}` — 설명 또는 파일 수정
///
/// 쪽 번호, 권 번호, 종류는 바꿀 수 없으므로 폼에 있어도 무시합니다.
pub async fn update_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Page>, AppError> {
    viewer.require_staff()?;
    let form = read_page_form(multipart).await?;
    if form.page_no.is_some() || form.volume_no.is_some() || form.page_type.is_some() {
        tracing::debug!(page_id = %id, "ignoring immutable page fields");
    }

    let changes = PageChanges {
        comments: form.comments,
        scanned_text: form.scanned_text,
        typed_text: form.typed_text,
    };
    let page = state.store.update(&id, changes, &viewer.user_id).await?;
    Ok(Json(page))
}

/// `DELETE /pages/{id}` — 페이지와 파일 삭제 (변경 이력은 남음)
pub async fn delete_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    viewer.require_staff()?;
    state.store.delete(&id, &viewer.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
