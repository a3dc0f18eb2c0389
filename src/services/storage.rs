//! # 페이지 파일 저장소 서비스
//!
//! 업로드된 PDF를 디스크에 저장하고 삭제하는 기능을 제공합니다.
//!
//! 저장 경로는 페이지 정보만으로 결정됩니다 (파일 내용과 무관):
//! `volume_{권}/page_{쪽}/volume_{권}_page_{쪽}_{typed|scanned}{원래 확장자}`
//!
//! 같은 경로에 파일이 이미 있으면 먼저 지우고 새로 씁니다.
//! 파일 이름에는 버전이 붙지 않으므로 버전 계보는 변경 이력에만 남습니다.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::AppError;
use crate::models::PageType;

/// 저장소 기준 상대 경로를 계산합니다.
///
/// # 예시
/// ```text
/// media_path(3, 12, Typed, "upload.pdf") → "volume_3/page_12/volume_3_page_12_typed.pdf"
/// media_path(3, 12, Scanned, "scan")     → "volume_3/page_12/volume_3_page_12_scanned"
/// ```
pub fn media_path(volume_no: i64, page_no: i64, page_type: PageType, file_name: &str) -> String {
    format!(
        "volume_{volume}/page_{page}/volume_{volume}_page_{page}_{slot}{ext}",
        volume = volume_no,
        page = page_no,
        slot = page_type.slot_name(),
        ext = original_extension(file_name),
    )
}

/// 원래 파일 이름의 마지막 확장자를 점(.) 포함해 돌려줍니다. 없으면 빈 문자열.
/// 경로 구분자가 섞여 들어와도 마지막 구성 요소만 봅니다.
fn original_extension(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(Path::new)
        .and_then(|name| name.extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// 디스크 기반 blob 저장소
///
/// `root` 아래에 상대 경로로 파일을 저장하고, `media_url`을 접두사로 붙여
/// 다운로드 URL을 만듭니다.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    media_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, media_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            media_url: media_url.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// 파일을 씁니다. 같은 경로에 파일이 있으면 먼저 삭제합니다.
    pub async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(&full_path).await? {
            fs::remove_file(&full_path).await?;
        }
        fs::write(&full_path, bytes).await?;
        tracing::debug!(path, size = bytes.len(), "stored document");
        Ok(())
    }

    /// 파일을 삭제합니다. 이미 없으면 아무 일도 하지 않습니다.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(test)]
    pub async fn exists(&self, path: &str) -> bool {
        fs::try_exists(self.full_path(path)).await.unwrap_or(false)
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.media_url, path)
    }

    /// `path`가 들어 있는 디렉토리의 파일을 모두 삭제합니다.
    ///
    /// 페이지 삭제 시 호출되며, 예전 확장자로 남은 파일 같은 고아 파일도 함께 지웁니다.
    /// `keep`에 있는 상대 경로(같은 위치의 다른 페이지에 묶인 파일)는 남깁니다.
    /// 디렉토리가 없으면 아무 일도 하지 않습니다. 지운 파일 수를 반환합니다.
    pub async fn clear_directory_of(&self, path: &str, keep: &[&str]) -> Result<usize, AppError> {
        let Some(dir) = self.full_path(path).parent().map(Path::to_path_buf) else {
            return Ok(0);
        };
        if !fs::try_exists(&dir).await? {
            return Ok(0);
        }

        let keep: Vec<PathBuf> = keep.iter().map(|p| self.full_path(p)).collect();
        let mut removed = 0;
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() && !keep.contains(&entry.path()) {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        tracing::debug!(dir = %dir.display(), removed, "cleared page directory");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn path_is_derived_from_location_type_and_extension() {
        assert_eq!(
            media_path(3, 3, PageType::Typed, "test_pdf.pdf"),
            "volume_3/page_3/volume_3_page_3_typed.pdf"
        );
        assert_eq!(
            media_path(12, 23, PageType::Scanned, "Scan 0001.PDF"),
            "volume_12/page_23/volume_12_page_23_scanned.PDF"
        );
        assert_eq!(
            media_path(1, 2, PageType::Scanned, "noext"),
            "volume_1/page_2/volume_1_page_2_scanned"
        );
        assert_eq!(
            media_path(1, 2, PageType::Typed, "../../etc/archive.tar.pdf"),
            "volume_1/page_2/volume_1_page_2_typed.pdf"
        );
    }

    #[tokio::test]
    async fn write_replaces_an_existing_file() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), "/media/");
        let path = media_path(3, 3, PageType::Typed, "a.pdf");

        storage.write(&path, b"first").await.unwrap();
        storage.write(&path, b"second").await.unwrap();

        let stored = std::fs::read(dir.path().join(&path)).unwrap();
        assert_eq!(stored, b"second");
        let files = std::fs::read_dir(dir.path().join("volume_3/page_3")).unwrap();
        assert_eq!(files.count(), 1);
    }

    #[tokio::test]
    async fn clearing_removes_stray_siblings() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), "/media/");
        let path = media_path(3, 3, PageType::Typed, "a.pdf");
        storage.write(&path, b"doc").await.unwrap();
        storage
            .write("volume_3/page_3/volume_3_page_3_typed.txt", b"stray")
            .await
            .unwrap();

        let removed = storage.clear_directory_of(&path, &[]).await.unwrap();

        assert_eq!(removed, 2);
        assert!(!storage.exists(&path).await);
        let files = std::fs::read_dir(dir.path().join("volume_3/page_3")).unwrap();
        assert_eq!(files.count(), 0);
    }

    #[tokio::test]
    async fn clearing_keeps_files_bound_to_other_pages() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), "/media/");
        let typed = media_path(12, 23, PageType::Typed, "t.pdf");
        let scanned = media_path(12, 23, PageType::Scanned, "s.pdf");
        storage.write(&typed, b"typed").await.unwrap();
        storage.write(&scanned, b"scanned").await.unwrap();

        let removed = storage.clear_directory_of(&typed, &[scanned.as_str()]).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!storage.exists(&typed).await);
        assert!(storage.exists(&scanned).await);
    }

    #[tokio::test]
    async fn clearing_a_missing_directory_is_a_no_op() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), "/media/");
        let removed = storage
            .clear_directory_of("volume_9/page_9/volume_9_page_9_typed.pdf", &[])
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn deleting_a_missing_file_succeeds() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), "/media/");
        storage.delete("volume_1/page_1/nothing.pdf").await.unwrap();
    }

    #[test]
    fn urls_use_the_media_prefix() {
        let storage = MediaStorage::new("/srv/media", "/media/");
        assert_eq!(
            storage.url_for("volume_1/page_1/volume_1_page_1_typed.pdf"),
            "/media/volume_1/page_1/volume_1_page_1_typed.pdf"
        );
    }
}
