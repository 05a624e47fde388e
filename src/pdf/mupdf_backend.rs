//! MuPDF-backed rendering and text extraction
//!
//! MuPDF documents are not thread-safe, so every call opens a fresh
//! `Document` and drops it before returning.

use std::io::Cursor;
use std::path::Path;

use mupdf::{Colorspace, Document, Matrix};

use super::traits::{PageRenderer, PageTextSource, TextExtractor, ThumbnailOptions};
use super::PdfError;

/// PDF points per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Stateless MuPDF collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct MuPdfBackend;

impl MuPdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn open_document(path: &Path) -> Result<Document, PdfError> {
        let path_str = path.to_string_lossy();
        Document::open(&*path_str).map_err(|e| PdfError::Load(e.to_string()))
    }

    /// Encode an RGB pixmap as JPEG
    fn encode_jpeg(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, PdfError> {
        let width = pixmap.width() as u32;
        let height = pixmap.height() as u32;
        let samples = pixmap.samples();
        let n = pixmap.n() as usize; // components per pixel

        let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let offset = (y * width as usize + x) * n;
                let r = samples.get(offset).copied().unwrap_or(0);
                let g = samples.get(offset + 1).copied().unwrap_or(r);
                let b = samples.get(offset + 2).copied().unwrap_or(r);
                rgb_buffer.extend_from_slice(&[r, g, b]);
            }
        }

        let img = image::RgbImage::from_raw(width, height, rgb_buffer)
            .ok_or_else(|| PdfError::Image("Failed to create image buffer".to_string()))?;

        let mut output = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Jpeg)
            .map_err(|e| PdfError::Image(e.to_string()))?;

        Ok(output)
    }
}

impl PageRenderer for MuPdfBackend {
    fn page_count(&self, path: &Path) -> Result<u32, PdfError> {
        let doc = Self::open_document(path)?;
        Ok(doc.page_count()?.max(0) as u32)
    }

    fn render_thumbnails(
        &self,
        path: &Path,
        options: &ThumbnailOptions,
    ) -> Result<Vec<Vec<u8>>, PdfError> {
        let doc = Self::open_document(path)?;
        let total = doc.page_count()?.max(0) as u32;
        let limit = options.max_pages.map_or(total, |max| max.min(total));

        let scale = options.dpi as f32 / POINTS_PER_INCH;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        let mut thumbnails = Vec::with_capacity(limit as usize);
        for index in 0..limit {
            let rendered = doc
                .load_page(index as i32)
                .and_then(|page| page.to_pixmap(&matrix, &colorspace, false, false));

            match rendered {
                Ok(pixmap) => thumbnails.push(Self::encode_jpeg(&pixmap)?),
                Err(e) => {
                    // Keep the images contiguous from page 1
                    tracing::warn!(page = index + 1, "Thumbnail render failed, stopping: {}", e);
                    break;
                }
            }
        }

        Ok(thumbnails)
    }
}

/// An open MuPDF document
struct MuPdfPages {
    doc: Document,
    page_count: u32,
}

impl PageTextSource for MuPdfPages {
    fn page_text(&mut self, page: u32) -> Result<String, PdfError> {
        if page < 1 || page > self.page_count {
            return Err(PdfError::PageNotFound(page, self.page_count));
        }

        let page = self.doc.load_page((page - 1) as i32)?;
        page.to_text().map_err(Into::into)
    }
}

impl TextExtractor for MuPdfBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageTextSource + 'a>, PdfError> {
        let doc = Self::open_document(path)?;
        let page_count = doc.page_count()?.max(0) as u32;
        Ok(Box::new(MuPdfPages { doc, page_count }))
    }
}
