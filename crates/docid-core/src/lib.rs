//! Core library for identity document field extraction.
//!
//! This crate provides:
//! - Text acquisition from images and PDFs (embedded text or page OCR)
//! - OCR backends (tesseract CLI, pure Rust ONNX models)
//! - MRZ detection, check-digit validation and normalization
//! - Scored candidate resolvers for document number, issuing country and expiration date
//! - Chained per-document-type extraction strategies with confidence tracking

pub mod acquisition;
pub mod error;
pub mod models;
pub mod mrz;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod resolvers;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use acquisition::{FileKind, TextAcquirer};
pub use error::{DocidError, Result};
pub use models::{DocidConfig, ExtractedDocument, ExtractionResult};
pub use mrz::{MrzNormalizer, MrzReader, MrzRecord, RawMrz, RawMrzDate};
pub use ocr::{OcrEngine, create_engine};
pub use pipeline::DocumentPipeline;
pub use strategy::{ExtractionInput, ExtractionStrategy, StrategyChain, StrategyRegistry, get_strategy};
