//! Visa sticker strategy.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{ExtractionInput, ExtractionStrategy, country_from_patterns, fill_gaps, resolve_checked_expiration};
use crate::models::ExtractionResult;
use crate::resolvers::{NumberProfile, find_country_name, is_valid_country_code, resolve_number};

lazy_static! {
    static ref COUNTRY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:Issuing\s*(?:Country|Post)|Authority)[:\s]*([A-Z]{3})\b").unwrap(),
        Regex::new(r"Issued\s*By[:\s]*([A-Z]{3})\b").unwrap(),
    ];
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VisaStrategy;

impl ExtractionStrategy for VisaStrategy {
    fn name(&self) -> &'static str {
        "VISA"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        let mrz = input.mrz;

        result.expiration_date = resolve_checked_expiration(input, &mut result);

        result.number = match mrz.and_then(|m| m.number()) {
            Some(number) => Some(number.to_string()),
            None => resolve_number(input.text, None, NumberProfile::visa()),
        };

        result.issued_country = mrz
            .and_then(|m| m.country())
            .filter(|code| is_valid_country_code(code))
            .map(str::to_string)
            .or_else(|| country_from_patterns(input.text, &COUNTRY_PATTERNS))
            .or_else(|| find_country_name(input.text).map(str::to_string));

        debug!(
            "Visa fields: number={:?} country={:?} expiry={:?}",
            result.number, result.issued_country, result.expiration_date
        );
        fill_gaps(result, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mrz::MrzRecord;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_visa_sticker() {
        let text = "VISA\nIssuing Post: FRA\nControl No. 202312345\nExpiration Date 15 MAR 2026";
        let input = ExtractionInput::new(text).with_today(ymd(2025, 1, 1));
        let result = VisaStrategy.extract(&input);
        assert_eq!(result.number.as_deref(), Some("202312345"));
        assert_eq!(result.issued_country.as_deref(), Some("FRA"));
        assert_eq!(result.expiration_date, Some(ymd(2026, 3, 15)));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_mrz_fields_first() {
        let mrz = MrzRecord {
            document_type: "V".to_string(),
            country_code: "USA".to_string(),
            number: "123456789".to_string(),
            expiration_date: Some(ymd(2027, 8, 1)),
            expiration_date_raw: Some("270801".to_string()),
        };
        let text = "Issuing Post: FRA\nControl No. 202312345\nExpiration Date 15 MAR 2026";
        let input = ExtractionInput::new(text).with_mrz(Some(&mrz)).with_today(ymd(2025, 1, 1));
        let result = VisaStrategy.extract(&input);
        assert_eq!(result.number.as_deref(), Some("123456789"));
        assert_eq!(result.issued_country.as_deref(), Some("USA"));
        assert_eq!(result.expiration_date, Some(ymd(2027, 8, 1)));
    }

    #[test]
    fn test_country_name_when_no_code() {
        let text = "SCHENGEN VISA\nREPUBLIQUE FRANCAISE\nVisa No 202312345";
        let result = VisaStrategy.extract(&ExtractionInput::new(text).with_today(ymd(2025, 1, 1)));
        assert_eq!(result.issued_country.as_deref(), Some("FRA"));
        assert_eq!(result.number.as_deref(), Some("202312345"));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let strategy = VisaStrategy;
        let input = ExtractionInput::new("Control No. 202312345").with_today(ymd(2025, 1, 1));
        let first = strategy.extract(&input);
        assert_eq!(strategy.extract(&input), first);
        assert_eq!(first.number.as_deref(), Some("202312345"));
    }

    #[test]
    fn test_far_future_expiry_is_kept_with_warning() {
        let text = "VISA\nIssuing Post: FRA\nControl No. 202312345\nExpiration Date 01/01/2060";
        let result = VisaStrategy.extract(&ExtractionInput::new(text).with_today(ymd(2025, 1, 1)));
        assert!(result.is_complete());
        assert_eq!(result.expiration_date, Some(ymd(2060, 1, 1)));
        assert_eq!(result.warnings, vec!["Suspiciously far future date: 2060-01-01".to_string()]);
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }
}
