//! Scripted collaborators for tests

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::traits::{PageRenderer, PageTextSource, TextExtractor, ThumbnailOptions};
use super::PdfError;

/// A fake PDF whose behaviour is fixed up front
pub struct ScriptedPdf {
    /// `None` makes `page_count` fail
    pub page_count: Option<u32>,
    /// `None` makes `render_thumbnails` fail; otherwise at most this many images
    pub thumbnails: Option<u32>,
    /// Pages whose text extraction fails
    pub failing_pages: HashSet<u32>,
    /// Pages that yield empty text
    pub blank_pages: HashSet<u32>,
    /// Makes `open` fail
    pub unreadable: bool,
    pub pages_read: AtomicUsize,
}

impl ScriptedPdf {
    /// A healthy document with `pages` pages
    pub fn with_pages(pages: u32) -> Self {
        Self {
            page_count: Some(pages),
            thumbnails: Some(pages),
            failing_pages: HashSet::new(),
            blank_pages: HashSet::new(),
            unreadable: false,
            pages_read: AtomicUsize::new(0),
        }
    }

    pub fn text_of(page: u32) -> String {
        format!("Text of page {}", page)
    }
}

impl PageRenderer for ScriptedPdf {
    fn page_count(&self, _path: &Path) -> Result<u32, PdfError> {
        self.page_count
            .ok_or_else(|| PdfError::Load("scripted page count failure".into()))
    }

    fn render_thumbnails(
        &self,
        _path: &Path,
        options: &ThumbnailOptions,
    ) -> Result<Vec<Vec<u8>>, PdfError> {
        let available = self
            .thumbnails
            .ok_or_else(|| PdfError::MuPdf("scripted render failure".into()))?;
        let count = options.max_pages.map_or(available, |max| max.min(available));
        Ok((1..=count).map(|page| vec![0xFF, 0xD8, page as u8]).collect())
    }
}

struct ScriptedPages<'a> {
    pdf: &'a ScriptedPdf,
}

impl PageTextSource for ScriptedPages<'_> {
    fn page_text(&mut self, page: u32) -> Result<String, PdfError> {
        self.pdf.pages_read.fetch_add(1, Ordering::SeqCst);
        let total = self.pdf.page_count.unwrap_or(0);
        if page > total {
            return Err(PdfError::PageNotFound(page, total));
        }
        if self.pdf.failing_pages.contains(&page) {
            return Err(PdfError::MuPdf(format!("scripted failure on page {}", page)));
        }
        if self.pdf.blank_pages.contains(&page) {
            return Ok("   \n".to_string());
        }
        Ok(ScriptedPdf::text_of(page))
    }
}

impl TextExtractor for ScriptedPdf {
    fn open<'a>(&'a self, _path: &Path) -> Result<Box<dyn PageTextSource + 'a>, PdfError> {
        if self.unreadable {
            return Err(PdfError::Load("scripted unreadable file".into()));
        }
        Ok(Box::new(ScriptedPages { pdf: self }))
    }
}
