//! Document processing
//!
//! [`DocumentProcessor`] drives uploads through rendering, applies page
//! selections, extracts text from active pages and queues audio.

mod extract;
mod orchestrator;

pub use extract::{extract_pages, page_marker};
pub use orchestrator::DocumentProcessor;
