//! PDF to Audio Server Library
//!
//! The server binary is in main.rs; everything it wires together lives here.
//!
//! # Modules
//!
//! - `document`: document model and page-selection rules
//! - `db`: SQLite repositories
//! - `pdf`: page rendering and text extraction collaborators (MuPDF)
//! - `processing`: the upload/extraction orchestrator
//! - `audio`: speech synthesis and the deferred audio queue
//! - `auth`: accounts and bearer tokens
//! - `routes`: the HTTP surface

pub mod audio;
pub mod auth;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod pdf;
pub mod processing;
pub mod routes;
pub mod state;
pub mod storage;
