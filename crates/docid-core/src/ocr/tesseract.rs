//! OCR through the `tesseract` command-line program.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, trace};

use super::OcrEngine;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Runs `tesseract <image> stdout` on a temporary PNG.
pub struct TesseractEngine {
    binary: PathBuf,
    languages: String,
    page_segmentation_mode: u8,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            languages: config.languages.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    /// Check whether the binary can be spawned.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn args(&self, image_path: &str) -> Vec<String> {
        vec![
            image_path.to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.languages.clone(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ]
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();

        let input = tempfile::Builder::new()
            .prefix("docid-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Recognition(format!("failed to create temp file: {}", e)))?;
        image
            .save_with_format(input.path(), image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let args = self.args(&input.path().to_string_lossy());
        trace!("Running {} {:?}", self.binary.display(), args);

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| OcrError::EngineUnavailable(format!("{}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(OcrError::Recognition(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "tesseract recognized {} chars in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args() {
        let engine = TesseractEngine::new().with_languages("eng+spa");
        assert_eq!(
            engine.args("/tmp/page.png"),
            vec!["/tmp/page.png", "stdout", "-l", "eng+spa", "--psm", "6"]
        );
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let config = OcrConfig {
            tesseract_path: PathBuf::from("/nonexistent/tesseract-binary"),
            ..OcrConfig::default()
        };
        let engine = TesseractEngine::from_config(&config);
        assert!(!engine.is_available());

        let image = DynamicImage::new_luma8(4, 4);
        assert!(matches!(
            engine.recognize(&image),
            Err(OcrError::EngineUnavailable(_))
        ));
    }
}
