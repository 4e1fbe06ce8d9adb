//! Text acquisition: document bytes to raw text.
//!
//! File kind is sniffed from content, never from a filename. Images go straight
//! to OCR. PDFs use their embedded text layer unless it is too sparse, in which
//! case every page is OCR'd instead; sparse embedded text is still kept when
//! page OCR yields nothing. Failures at any stage are logged and end up as
//! empty text; nothing here returns an error to the caller.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{AcquisitionError, DocidError};
use crate::models::config::PdfConfig;
use crate::ocr::OcrEngine;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Kind of document detected from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Raster image with its MIME type.
    Image(&'static str),
    Pdf,
}

impl FileKind {
    /// Sniff the file kind from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let kind = infer::get(bytes)?;
        let mime = kind.mime_type();
        if mime == "application/pdf" {
            Some(FileKind::Pdf)
        } else if mime.starts_with("image/") {
            Some(FileKind::Image(mime))
        } else {
            debug!("Unsupported file kind: {}", mime);
            None
        }
    }

    /// File suffix for temporary copies.
    pub fn suffix(&self) -> &'static str {
        match self {
            FileKind::Pdf => ".pdf",
            FileKind::Image("image/jpeg") => ".jpg",
            FileKind::Image("image/tiff") => ".tif",
            FileKind::Image("image/bmp") => ".bmp",
            FileKind::Image("image/webp") => ".webp",
            FileKind::Image(_) => ".png",
        }
    }
}

/// Turns document bytes into OCR or embedded text.
pub struct TextAcquirer {
    ocr: Option<Arc<dyn OcrEngine>>,
    min_text_length: usize,
    max_pages: usize,
}

impl TextAcquirer {
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self::from_config(&PdfConfig::default(), ocr)
    }

    pub fn from_config(config: &PdfConfig, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self {
            ocr,
            min_text_length: config.min_text_length,
            max_pages: config.max_pages,
        }
    }

    pub fn with_ocr(mut self, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        self.ocr = ocr;
        self
    }

    /// Extract text from document bytes. Returns an empty string on failure.
    pub fn extract_text(&self, bytes: &[u8]) -> String {
        let Some(kind) = FileKind::detect(bytes) else {
            warn!("Could not detect file kind ({} bytes)", bytes.len());
            return String::new();
        };
        self.extract_text_as(kind, bytes)
    }

    /// Extract text from bytes already known to be of `kind`.
    pub fn extract_text_as(&self, kind: FileKind, bytes: &[u8]) -> String {
        info!("Acquiring text from {:?}", kind);
        let result = match kind {
            FileKind::Image(_) => self.image_text(bytes),
            FileKind::Pdf => self.pdf_text(bytes),
        };

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!("Text acquisition failed: {}", e);
                String::new()
            }
        }
    }

    fn image_text(&self, bytes: &[u8]) -> Result<String, DocidError> {
        let image = image::load_from_memory(bytes)?;
        self.ocr(&image)
    }

    fn pdf_text(&self, bytes: &[u8]) -> Result<String, DocidError> {
        let mut extractor = PdfExtractor::new();
        extractor.load(bytes)?;

        let embedded = extractor.extract_text().unwrap_or_else(|e| {
            debug!("Embedded text extraction failed: {}", e);
            String::new()
        });

        if self.is_enough_text(&embedded) {
            debug!("Using {} bytes of embedded PDF text", embedded.len());
            return Ok(embedded);
        }

        info!(
            "Embedded PDF text too short ({} chars), running OCR on pages",
            embedded.trim().chars().count()
        );
        match self.ocr_pages(&extractor) {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                warn!("Page OCR produced no text, keeping embedded text");
                Ok(embedded)
            }
            Err(e) => {
                warn!("Page OCR unavailable ({}), keeping embedded text", e);
                Ok(embedded)
            }
        }
    }

    /// Embedded text of at least `min_text_length` characters, not bytes.
    fn is_enough_text(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_text_length
    }

    fn ocr_pages(&self, extractor: &PdfExtractor) -> Result<String, DocidError> {
        if self.ocr.is_none() {
            return Err(AcquisitionError::NoOcrEngine.into());
        }

        let mut page_count = extractor.page_count();
        if self.max_pages > 0 {
            page_count = page_count.min(self.max_pages as u32);
        }

        let mut pages = Vec::new();
        for page in 1..=page_count {
            let text = extractor
                .render_page(page)
                .map_err(DocidError::from)
                .and_then(|image| self.ocr(&image));
            match text {
                Ok(text) => pages.push(text),
                Err(e) => warn!("OCR failed for page {}: {}", page, e),
            }
        }

        Ok(pages.join("\n"))
    }

    fn ocr(&self, image: &DynamicImage) -> Result<String, DocidError> {
        let engine = self.ocr.as_ref().ok_or(AcquisitionError::NoOcrEngine)?;
        debug!("Running {} OCR", engine.name());
        Ok(engine.recognize(image)?)
    }
}

/// First page of a PDF, or the image itself, for tools that need a file on disk.
pub fn first_page_image(kind: FileKind, bytes: &[u8]) -> Result<DynamicImage, DocidError> {
    match kind {
        FileKind::Image(_) => Ok(image::load_from_memory(bytes)?),
        FileKind::Pdf => {
            let mut extractor = PdfExtractor::new();
            extractor.load(bytes)?;
            Ok(extractor.render_page(1)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingOcr, FixedOcr, png_bytes, text_pdf};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_kinds() {
        assert_eq!(FileKind::detect(&png_bytes()), Some(FileKind::Image("image/png")));
        assert_eq!(FileKind::detect(b"%PDF-1.5\n%\xe2\xe3\xcf\xd3\n"), Some(FileKind::Pdf));
        assert_eq!(FileKind::detect(b"plain text"), None);
        assert_eq!(FileKind::detect(&[]), None);
    }

    #[test]
    fn test_suffix() {
        assert_eq!(FileKind::Image("image/jpeg").suffix(), ".jpg");
        assert_eq!(FileKind::Image("image/png").suffix(), ".png");
        assert_eq!(FileKind::Pdf.suffix(), ".pdf");
    }

    #[test]
    fn test_image_goes_to_ocr() {
        let acquirer = TextAcquirer::new(Some(Arc::new(FixedOcr::new("P<ESP"))));
        assert_eq!(acquirer.extract_text(&png_bytes()), "P<ESP");
    }

    #[test]
    fn test_unknown_bytes_yield_empty_text() {
        let acquirer = TextAcquirer::new(Some(Arc::new(FixedOcr::new("never"))));
        assert_eq!(acquirer.extract_text(b"hello world, not a document"), "");
    }

    #[test]
    fn test_ocr_failure_yields_empty_text() {
        let acquirer = TextAcquirer::new(Some(Arc::new(FailingOcr)));
        assert_eq!(acquirer.extract_text(&png_bytes()), "");
    }

    #[test]
    fn test_image_without_engine_yields_empty_text() {
        let acquirer = TextAcquirer::new(None);
        assert_eq!(acquirer.extract_text(&png_bytes()), "");
    }

    #[test]
    fn test_corrupt_pdf_yields_empty_text() {
        let acquirer = TextAcquirer::new(Some(Arc::new(FixedOcr::new("never"))));
        assert_eq!(acquirer.extract_text(b"%PDF-1.4\ngarbage"), "");
    }

    #[test]
    fn test_first_page_image_of_png() {
        let image = first_page_image(FileKind::Image("image/png"), &png_bytes()).unwrap();
        assert_eq!(image.width(), 8);
    }

    #[test]
    fn test_short_pdf_text_kept_without_engine() {
        let acquirer = TextAcquirer::new(None);
        let text = acquirer.extract_text(&text_pdf("PASSPORT NO X1234567 EXP 2030"));
        assert!(text.contains("PASSPORT NO X1234567 EXP 2030"), "got {:?}", text);
    }

    #[test]
    fn test_short_pdf_text_kept_when_pages_cannot_be_ocred() {
        // A text-only page has no raster to hand to OCR.
        let ocr = Arc::new(FixedOcr::new("never"));
        let acquirer = TextAcquirer::new(Some(Arc::clone(&ocr) as Arc<dyn OcrEngine>));
        let text = acquirer.extract_text(&text_pdf("PASSPORT NO X1234567 EXP 2030"));
        assert!(text.contains("PASSPORT NO X1234567 EXP 2030"), "got {:?}", text);
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn test_long_pdf_text_skips_ocr() {
        let ocr = Arc::new(FixedOcr::new("never"));
        let acquirer = TextAcquirer::new(Some(Arc::clone(&ocr) as Arc<dyn OcrEngine>));
        let line = "PASSPORT NO X1234567 DATE OF EXPIRY 01 JAN 2030 REINO DE ESPANA";
        let text = acquirer.extract_text(&text_pdf(line));
        assert!(text.contains(line), "got {:?}", text);
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn test_text_threshold_counts_characters() {
        let acquirer = TextAcquirer::new(None);
        // 60 bytes, 30 characters.
        assert!(!acquirer.is_enough_text(&"é".repeat(30)));
        assert!(acquirer.is_enough_text(&"é".repeat(50)));
        assert!(!acquirer.is_enough_text(&format!("  {}  ", "A".repeat(49))));
    }
}
