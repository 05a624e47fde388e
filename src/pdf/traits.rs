//! Collaborator traits for page rendering and text extraction

use std::path::Path;

use super::PdfError;

/// Thumbnail rendering parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    /// Render at most this many leading pages
    pub max_pages: Option<u32>,
    pub dpi: u32,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_pages: Some(24),
            dpi: 50,
        }
    }
}

/// Page counting and thumbnail rendering
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the file
    fn page_count(&self, path: &Path) -> Result<u32, PdfError>;

    /// JPEG thumbnails for the leading pages, in page order.
    ///
    /// May return fewer images than requested when a page fails to render;
    /// the images returned are always pages `1..=len`.
    fn render_thumbnails(
        &self,
        path: &Path,
        options: &ThumbnailOptions,
    ) -> Result<Vec<Vec<u8>>, PdfError>;
}

/// Opens a file for page-by-page text extraction
pub trait TextExtractor: Send + Sync {
    /// Fails only when the file as a whole cannot be read
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageTextSource + 'a>, PdfError>;
}

/// An opened document yielding text per 1-indexed page
pub trait PageTextSource {
    fn page_text(&mut self, page: u32) -> Result<String, PdfError>;
}
