//! Document domain types
//!
//! `Document` is the uploaded PDF and its page selection; `ProcessedDocument`
//! holds the text derived from it. Both are plain values: persistence lives in
//! `crate::db`, page arithmetic in [`super::selection`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::selection;

/// Lifecycle of an upload through thumbnail generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Uploaded,
    Rendering,
    Ready,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Uploaded => "uploaded",
            ProcessingStatus::Rendering => "rendering",
            ProcessingStatus::Ready => "ready",
            ProcessingStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "rendering" => Ok(Self::Rendering),
            "ready" => Ok(Self::Ready),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown processing status '{}'", other)),
        }
    }
}

/// Narration state of a processed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AudioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioStatus::Pending => "pending",
            AudioStatus::Processing => "processing",
            AudioStatus::Completed => "completed",
            AudioStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AudioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown audio status '{}'", other)),
        }
    }
}

/// An uploaded PDF owned by a single user
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    /// Path of the original file, relative to the media root
    pub file_path: String,
    pub uploaded_at: String,
    pub total_pages: u32,
    /// Sorted, deduplicated, every entry in `1..=total_pages`
    pub excluded_pages: Vec<u32>,
    pub thumbnails_ready: bool,
    pub thumbnail_count: u32,
    pub status: ProcessingStatus,
    /// Bumped on every excluded-pages write
    pub version: i64,
}

impl Document {
    pub fn active_pages(&self) -> Vec<u32> {
        selection::compute_active_pages(self.total_pages, &self.excluded_pages)
    }

    pub fn active_pages_count(&self) -> u32 {
        self.total_pages.saturating_sub(self.excluded_pages_count())
    }

    pub fn excluded_pages_count(&self) -> u32 {
        self.excluded_pages.len() as u32
    }

    pub fn is_excluded(&self, page: u32) -> bool {
        self.excluded_pages.binary_search(&page).is_ok()
    }
}

/// Text derived from a document's active pages
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDocument {
    pub id: String,
    pub document_id: String,
    pub extracted_text: String,
    /// Excluded pages in effect when `extracted_text` was produced
    pub source_excluded_pages: Vec<u32>,
    pub edited_text: Option<String>,
    pub audio_status: AudioStatus,
    pub audio_file: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProcessedDocument {
    /// Text handed to narration: the user's edit wins when it is non-empty
    pub fn text_for_audio(&self) -> Option<&str> {
        self.edited_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(Some(self.extracted_text.as_str()))
            .filter(|t| !t.trim().is_empty())
    }
}
