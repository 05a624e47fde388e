//! PDF collaborators
//!
//! The orchestrator only sees the [`PageRenderer`] and [`TextExtractor`]
//! traits. [`MuPdfBackend`] implements both on top of MuPDF.
//!
//! All calls are blocking and CPU-bound; callers run them on the blocking
//! thread pool.

mod mupdf_backend;
mod traits;

#[cfg(test)]
pub mod testing;

pub use mupdf_backend::MuPdfBackend;
pub use traits::{PageRenderer, PageTextSource, TextExtractor, ThumbnailOptions};

use thiserror::Error;

/// PDF collaborator errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    Load(String),
    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(u32, u32),
    #[error("Image encoding error: {0}")]
    Image(String),
    #[error("MuPDF error: {0}")]
    MuPdf(String),
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

impl From<mupdf::Error> for PdfError {
    fn from(e: mupdf::Error) -> Self {
        PdfError::MuPdf(e.to_string())
    }
}
