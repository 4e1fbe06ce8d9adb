//! File-based MRZ readers.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::parser::{MrzScan, scan_text};
use crate::error::MrzError;
use crate::ocr::OcrEngine;

/// Reads an MRZ straight from a document image on disk.
pub trait MrzReader: Send + Sync {
    /// `Ok(None)` when the image has no MRZ.
    fn read_file(&self, path: &Path) -> Result<Option<MrzScan>, MrzError>;
}

/// MRZ reader that OCRs the whole image and parses the MRZ lines it finds.
pub struct OcrMrzReader {
    ocr: Arc<dyn OcrEngine>,
}

impl OcrMrzReader {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl MrzReader for OcrMrzReader {
    fn read_file(&self, path: &Path) -> Result<Option<MrzScan>, MrzError> {
        info!("Reading MRZ from {}", path.display());
        let image = image::open(path)?;
        let text = self.ocr.recognize(&image)?;
        let scan = scan_text(&text)?;
        debug!("MRZ reader result: {:?}", scan);
        Ok(scan)
    }
}
