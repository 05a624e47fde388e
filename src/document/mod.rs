//! Document model
//!
//! - `types`: `Document`, `ProcessedDocument` and their status enums
//! - `selection`: active-page computation and exclusion validation

mod selection;
mod types;

pub use selection::{compute_active_pages, validate_and_normalize, InvalidPageRange};
pub use types::{AudioStatus, Document, ProcessedDocument, ProcessingStatus};

/// Detect a PDF from its magic bytes
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes.starts_with(b"%PDF")
}
