//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the docid pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocidConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

impl Default for DocidConfig {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            pdf: PdfConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Which OCR backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// The `tesseract` command-line program.
    Tesseract,
    /// Pure Rust ONNX models (requires the `native` feature).
    Onnx,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Backend used for recognition.
    pub backend: OcrBackend,

    /// Path or name of the tesseract executable.
    pub tesseract_path: PathBuf,

    /// Tesseract language list, `+`-separated (e.g. "eng+spa+deu").
    pub languages: String,

    /// Tesseract page segmentation mode.
    pub page_segmentation_mode: u8,

    /// Directory with det.onnx, latin_rec.onnx and latin_dict.txt for the ONNX backend.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens emitted by the ONNX recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Tesseract,
            tesseract_path: PathBuf::from("tesseract"),
            languages: "eng".to_string(),
            page_segmentation_mode: 6,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Embedded text shorter than this (after trimming) triggers page OCR.
    pub min_text_length: usize,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            max_pages: 10,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum MRZ check-digit score (0-100) for MRZ data to be used at all.
    pub min_mrz_score: u8,

    /// Look for MRZ lines in the OCR text when the caller supplies none.
    pub detect_mrz_in_text: bool,

    /// Let the MRZ-preferring strategy read the document file directly.
    pub use_mrz_reader: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_mrz_score: 50,
            detect_mrz_in_text: true,
            use_mrz_reader: true,
        }
    }
}

impl DocidConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
