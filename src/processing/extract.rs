//! Active-page text assembly

use std::path::Path;

use crate::pdf::{PdfError, TextExtractor};

/// Header placed before each page's text
pub fn page_marker(page: u32) -> String {
    format!("--- Page {} ---", page)
}

/// Extract and join the text of `pages`, in order.
///
/// Pages that fail or yield only whitespace are skipped. Only failing to open
/// the file is an error.
pub fn extract_pages(
    extractor: &dyn TextExtractor,
    path: &Path,
    pages: &[u32],
) -> Result<String, PdfError> {
    let mut source = extractor.open(path)?;
    let mut sections = Vec::with_capacity(pages.len());

    for &page in pages {
        match source.page_text(page) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    sections.push(format!("{}\n{}", page_marker(page), text));
                }
            }
            Err(e) => {
                tracing::warn!(page, path = %path.display(), "Skipping page during extraction: {}", e);
            }
        }
    }

    Ok(sections.join("\n\n"))
}
