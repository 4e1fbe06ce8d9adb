//! Per-strategy extraction result with confidence bookkeeping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Confidence lost for every recorded validation error.
pub const ERROR_PENALTY: f32 = 0.2;

/// Confidence lost for every recorded warning.
pub const WARNING_PENALTY: f32 = 0.1;

/// Output of exactly one strategy invocation.
///
/// Confidence starts at 1.0 and only ever goes down while a strategy runs:
/// every error costs [`ERROR_PENALTY`], every warning [`WARNING_PENALTY`],
/// floored at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document number.
    pub number: Option<String>,
    /// Issuing country (ISO 3166-1 alpha-3).
    pub issued_country: Option<String>,
    /// Expiration date.
    pub expiration_date: Option<NaiveDate>,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Validation errors in the order they were recorded.
    pub validation_errors: Vec<String>,
    /// Warnings in the order they were recorded.
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// Create an empty result with full confidence.
    pub fn new() -> Self {
        Self {
            number: None,
            issued_country: None,
            expiration_date: None,
            confidence: 1.0,
            validation_errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.issued_country = Some(country.into());
        self
    }

    pub fn with_expiration(mut self, date: NaiveDate) -> Self {
        self.expiration_date = Some(date);
        self
    }

    /// Record a validation error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.validation_errors.push(message.into());
        self.confidence = (self.confidence - ERROR_PENALTY).max(0.0);
    }

    /// Record a warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
        self.confidence = (self.confidence - WARNING_PENALTY).max(0.0);
    }

    /// All three target fields are present.
    pub fn is_complete(&self) -> bool {
        has_text(&self.number) && has_text(&self.issued_country) && self.expiration_date.is_some()
    }

    /// No validation errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    /// At least one target field is still missing.
    pub fn has_gaps(&self) -> bool {
        !self.is_complete()
    }

    /// Merge with a fallback result.
    ///
    /// Fields keep `self`'s value when present and take the fallback's otherwise.
    /// Confidence is the lower of the two, error and warning lists are
    /// concatenated with `self` first.
    pub fn merge(self, fallback: ExtractionResult) -> ExtractionResult {
        let mut validation_errors = self.validation_errors;
        validation_errors.extend(fallback.validation_errors);
        let mut warnings = self.warnings;
        warnings.extend(fallback.warnings);

        ExtractionResult {
            number: non_empty(self.number).or(non_empty(fallback.number)),
            issued_country: non_empty(self.issued_country).or(non_empty(fallback.issued_country)),
            expiration_date: self.expiration_date.or(fallback.expiration_date),
            confidence: self.confidence.min(fallback.confidence),
            validation_errors,
            warnings,
        }
    }
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self::new()
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
