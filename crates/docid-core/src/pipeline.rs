//! End-to-end extraction: bytes in, [`ExtractedDocument`] out.

use std::io::Write;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::acquisition::{FileKind, TextAcquirer, first_page_image};
use crate::error::{AcquisitionError, Result};
use crate::models::{DocidConfig, ExtractedDocument, ExtractionConfig};
use crate::mrz::{MrzNormalizer, MrzReader, MrzRecord, OcrMrzReader, RawMrz};
use crate::ocr::{OcrEngine, create_engine};
use crate::strategy::{ExtractionInput, StrategyRegistry};

/// Runs text acquisition, MRZ normalization and the strategy chain for one
/// document at a time.
///
/// The pipeline itself holds only shared, read-only collaborators. Every
/// call builds its own chain and temporary file, so one pipeline may serve
/// concurrent calls.
pub struct DocumentPipeline {
    acquirer: TextAcquirer,
    registry: StrategyRegistry,
    config: ExtractionConfig,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl DocumentPipeline {
    /// Build the OCR engine and MRZ reader described by `config`.
    ///
    /// An OCR engine that cannot be created is logged and left out; the
    /// pipeline then only handles PDFs with an embedded text layer.
    pub fn new(config: &DocidConfig) -> Self {
        let ocr = match create_engine(&config.ocr) {
            Ok(engine) => Some(engine),
            Err(e) => {
                warn!("OCR engine unavailable: {}", e);
                None
            }
        };

        let pipeline = Self {
            acquirer: TextAcquirer::from_config(&config.pdf, None),
            registry: StrategyRegistry::new().with_min_mrz_score(config.extraction.min_mrz_score),
            config: config.extraction.clone(),
            ocr: None,
        };
        match ocr {
            Some(engine) => pipeline.with_ocr(engine),
            None => pipeline,
        }
    }

    /// Use `ocr` for text acquisition and, when enabled, for the MRZ reader.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.acquirer = self.acquirer.with_ocr(Some(Arc::clone(&ocr)));
        if self.config.use_mrz_reader {
            self.registry = self.registry.with_mrz_reader(Arc::new(OcrMrzReader::new(Arc::clone(&ocr))));
        }
        self.ocr = Some(ocr);
        self
    }

    pub fn with_mrz_reader(mut self, reader: Arc<dyn MrzReader>) -> Self {
        self.registry = self.registry.with_mrz_reader(reader);
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract fields from document bytes, or `None` if nothing could be read.
    pub fn extract(&self, bytes: &[u8], hint: &str, raw_mrz: Option<&RawMrz>) -> Option<ExtractedDocument> {
        self.extract_at(bytes, hint, raw_mrz, Local::now().date_naive())
    }

    /// [`extract`](Self::extract) with an explicit reference date.
    pub fn extract_at(
        &self,
        bytes: &[u8],
        hint: &str,
        raw_mrz: Option<&RawMrz>,
        today: NaiveDate,
    ) -> Option<ExtractedDocument> {
        match self.try_extract(bytes, hint, raw_mrz, today) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Extraction failed: {}", e);
                None
            }
        }
    }

    /// The fallible path behind [`extract_at`](Self::extract_at).
    pub fn try_extract(
        &self,
        bytes: &[u8],
        hint: &str,
        raw_mrz: Option<&RawMrz>,
        today: NaiveDate,
    ) -> Result<ExtractedDocument> {
        let kind = FileKind::detect(bytes).ok_or(AcquisitionError::UnsupportedKind)?;
        let text = self.acquirer.extract_text_as(kind, bytes);
        if text.trim().is_empty() {
            return Err(AcquisitionError::NoText.into());
        }
        debug!("Acquired {} chars of text", text.len());

        let mrz = self.normalize_mrz(&text, raw_mrz, today);
        let chain = self.registry.get_strategy_for(hint, mrz.as_ref().and_then(MrzRecord::country));

        // Deleted on drop, whichever way this function exits.
        let file = if chain.requires_file() {
            match materialize(kind, bytes) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("Could not write temporary document file: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let input = ExtractionInput::new(&text)
            .with_mrz(mrz.as_ref())
            .with_file(file.as_ref().map(NamedTempFile::path))
            .with_today(today);
        let document = ExtractedDocument::from(chain.run(&input));
        info!(
            "Extracted {}/3 fields (confidence {:.2})",
            document.filled_fields(),
            document.confidence
        );
        Ok(document)
    }

    /// Run the strategy chain on text that has already been acquired.
    pub fn extract_text_document(
        &self,
        text: &str,
        hint: &str,
        raw_mrz: Option<&RawMrz>,
        today: NaiveDate,
    ) -> ExtractedDocument {
        let mrz = self.normalize_mrz(text, raw_mrz, today);
        let chain = self.registry.get_strategy_for(hint, mrz.as_ref().and_then(MrzRecord::country));
        let input = ExtractionInput::new(text).with_mrz(mrz.as_ref()).with_today(today);
        ExtractedDocument::from(chain.run(&input))
    }

    /// Caller-supplied MRZ wins; otherwise MRZ lines are looked for in the text.
    fn normalize_mrz(&self, text: &str, raw_mrz: Option<&RawMrz>, today: NaiveDate) -> Option<MrzRecord> {
        let normalizer = MrzNormalizer::new(self.config.min_mrz_score);
        match raw_mrz {
            Some(raw) => normalizer.normalize_raw(raw, today),
            None if self.config.detect_mrz_in_text => normalizer.normalize_text(text),
            None => None,
        }
    }
}

impl Default for DocumentPipeline {
    fn default() -> Self {
        Self::new(&DocidConfig::default())
    }
}

/// Write the document, or the first page of a PDF, to a temporary file.
fn materialize(kind: FileKind, bytes: &[u8]) -> Result<NamedTempFile> {
    match kind {
        FileKind::Image(_) => {
            let mut file = tempfile::Builder::new().prefix("docid-").suffix(kind.suffix()).tempfile()?;
            file.write_all(bytes)?;
            file.flush()?;
            Ok(file)
        }
        FileKind::Pdf => {
            let page = first_page_image(kind, bytes)?;
            let file = tempfile::Builder::new().prefix("docid-").suffix(".png").tempfile()?;
            page.save_with_format(file.path(), image::ImageFormat::Png)?;
            Ok(file)
        }
    }
}
