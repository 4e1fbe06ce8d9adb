//! Error types for the docid-core library.

use thiserror::Error;

/// Main error type for the docid library.
#[derive(Error, Debug)]
pub enum DocidError {
    /// Text acquisition error.
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// MRZ parsing error.
    #[error("MRZ error: {0}")]
    Mrz(#[from] MrzError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning document bytes into text.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Content sniffing found neither an image nor a PDF.
    #[error("unsupported or undetected file kind")]
    UnsupportedKind,

    /// Every extraction path produced empty text.
    #[error("no text could be extracted")]
    NoText,

    /// The document needs OCR but no engine is configured.
    #[error("no OCR engine available")]
    NoOcrEngine,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR backend could not be started.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to machine-readable zone parsing.
#[derive(Error, Debug)]
pub enum MrzError {
    /// No MRZ lines were found.
    #[error("no MRZ found")]
    NotFound,

    /// Lines were found but do not form a known layout.
    #[error("malformed MRZ: {0}")]
    Malformed(String),

    /// The check-digit score is below the acceptance threshold.
    #[error("MRZ score {score} below threshold {threshold}")]
    LowScore { score: u8, threshold: u8 },

    /// The expiration date could not be interpreted.
    #[error("invalid MRZ date: {0}")]
    InvalidDate(String),

    /// OCR of the MRZ region failed.
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    /// The source image could not be opened.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for the docid library.
pub type Result<T> = std::result::Result<T, DocidError>;
