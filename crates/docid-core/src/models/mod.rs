//! Data models for document extraction.

pub mod config;
pub mod document;
pub mod result;

pub use config::{DocidConfig, ExtractionConfig, OcrBackend, OcrConfig, PdfConfig};
pub use document::ExtractedDocument;
pub use result::ExtractionResult;
