//! Local media storage
//!
//! Layout under the media root, one directory per document id:
//!
//! ```text
//! pdfs/{document_id}/{filename}
//! thumbnails/{document_id}/page_{n}.jpg
//! audio/audio_{document_id}_{unix_millis}.wav
//! ```
//!
//! Stored paths are always relative to the root so the root can move.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Filesystem-backed media store
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored relative path
    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Resolve a client-supplied relative path, refusing anything that escapes the root
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (safe && !relative.is_empty()).then(|| self.root.join(path))
    }

    pub fn thumbnail_path(document_id: &str, page: u32) -> String {
        format!("thumbnails/{}/page_{}.jpg", document_id, page)
    }

    pub fn audio_path(document_id: &str, unix_millis: i64) -> String {
        format!("audio/audio_{}_{}.wav", document_id, unix_millis)
    }

    /// Persist an uploaded original; returns its relative path
    pub async fn save_upload(
        &self,
        document_id: &str,
        filename: &str,
        data: &[u8],
    ) -> io::Result<String> {
        let relative = format!("pdfs/{}/{}", document_id, filename);
        let path = self.absolute(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        tracing::debug!(document_id, path = %path.display(), bytes = data.len(), "Stored upload");
        Ok(relative)
    }

    /// Write page thumbnails `1..=images.len()`; returns how many were written
    pub async fn write_thumbnails(&self, document_id: &str, images: &[Vec<u8>]) -> io::Result<u32> {
        let dir = self.root.join("thumbnails").join(document_id);
        tokio::fs::create_dir_all(&dir).await?;

        for (index, image) in images.iter().enumerate() {
            let page = index as u32 + 1;
            tokio::fs::write(self.absolute(&Self::thumbnail_path(document_id, page)), image)
                .await?;
        }

        Ok(images.len() as u32)
    }

    /// Make sure the parent directory of a relative path exists
    pub async fn prepare(&self, relative: &str) -> io::Result<PathBuf> {
        let path = self.absolute(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(path)
    }

    /// Remove every file belonging to a document
    pub async fn remove_document(&self, document_id: &str) -> io::Result<()> {
        for dir in ["pdfs", "thumbnails"] {
            let path = self.root.join(dir).join(document_id);
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Reduce a client-supplied file name to a safe basename
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() || c == ':' { '_' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}
