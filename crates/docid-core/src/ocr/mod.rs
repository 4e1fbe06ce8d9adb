//! OCR backends.
//!
//! Everything downstream only needs plain text in reading order, so engines
//! expose a single `recognize` call.

mod tesseract;
#[cfg(feature = "native")]
mod pure_engine;

pub use tesseract::TesseractEngine;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::sync::Arc;

use image::DynamicImage;
use tracing::info;

use crate::error::OcrError;
use crate::models::config::{OcrBackend, OcrConfig};

/// Trait for OCR implementations.
pub trait OcrEngine: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Recognize all text in an image, lines separated by `\n`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognized text fragment with its axis-aligned bounding rectangle.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    /// (min_x, min_y, max_x, max_y)
    pub rect: (f32, f32, f32, f32),
    pub confidence: f32,
}

/// Sort fragments top-to-bottom, then left-to-right within a 20px row band.
pub fn sort_reading_order(fragments: &mut [TextFragment]) {
    fragments.sort_by(|a, b| {
        let row_a = (a.rect.1 / 20.0) as i32;
        let row_b = (b.rect.1 / 20.0) as i32;
        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            a.rect
                .0
                .partial_cmp(&b.rect.0)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

/// Build the engine selected in the configuration.
pub fn create_engine(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
    match config.backend {
        OcrBackend::Tesseract => {
            info!("Using tesseract OCR at {}", config.tesseract_path.display());
            Ok(Arc::new(TesseractEngine::from_config(config)))
        }
        #[cfg(feature = "native")]
        OcrBackend::Onnx => Ok(Arc::new(PureOcrEngine::from_dir(&config.model_dir, config.clone())?)),
        #[cfg(not(feature = "native"))]
        OcrBackend::Onnx => Err(OcrError::EngineUnavailable(
            "ONNX backend requires the `native` feature".to_string(),
        )),
    }
}
