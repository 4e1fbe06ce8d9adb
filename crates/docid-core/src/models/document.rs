//! Final payload handed back to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::result::ExtractionResult;

/// Fields extracted from one identity document.
///
/// Any subset of the three target fields may be missing; callers persisting
/// this must not overwrite previously stored values with `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Document number.
    pub number: Option<String>,
    /// Issuing country, ISO 3166-1 alpha-3 when resolvable.
    pub document_country: Option<String>,
    /// Expiration date.
    pub expiration_date: Option<NaiveDate>,
    /// Merged confidence, rounded to two decimals.
    pub confidence: f32,
    /// Validation errors from every strategy consulted.
    pub validation_errors: Vec<String>,
    /// Warnings from every strategy consulted.
    pub warnings: Vec<String>,
}

impl ExtractedDocument {
    /// Number of target fields that were filled.
    pub fn filled_fields(&self) -> usize {
        [
            self.number.is_some(),
            self.document_country.is_some(),
            self.expiration_date.is_some(),
        ]
        .iter()
        .filter(|filled| **filled)
        .count()
    }
}

impl From<ExtractionResult> for ExtractedDocument {
    fn from(result: ExtractionResult) -> Self {
        Self {
            number: result.number.filter(|n| !n.is_empty()),
            document_country: result.issued_country.filter(|c| !c.is_empty()),
            expiration_date: result.expiration_date,
            confidence: (result.confidence * 100.0).round() / 100.0,
            validation_errors: result.validation_errors,
            warnings: result.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_result_aliases_country() {
        let mut result = ExtractionResult::new()
            .with_number("12345678Z")
            .with_country("ESP");
        result.add_warning("far future");

        let doc = ExtractedDocument::from(result);
        assert_eq!(doc.document_country.as_deref(), Some("ESP"));
        assert_eq!(doc.number.as_deref(), Some("12345678Z"));
        assert_eq!(doc.confidence, 0.9);
        assert_eq!(doc.filled_fields(), 2);
    }

    #[test]
    fn test_serializes_expected_keys() {
        let doc = ExtractedDocument::from(
            ExtractionResult::new().with_expiration(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["expiration_date"], "2030-01-01");
        assert!(json["number"].is_null());
        assert!(json["document_country"].is_null());
        assert_eq!(json["validation_errors"], serde_json::json!([]));
    }
}
