//! National ID card strategy (also used for driving licences).

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{ExtractionInput, ExtractionStrategy, country_from_patterns, fill_gaps, resolve_checked_expiration};
use crate::models::ExtractionResult;
use crate::resolvers::{NumberProfile, find_country_name, is_valid_country_code, resolve_number};

lazy_static! {
    static ref COUNTRY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:Issuing|Issued\s+by|Authority)[:\s]*([A-Z]{3})\b").unwrap(),
        Regex::new(r"\bNationality[:\s]*([A-Z]{3})\b").unwrap(),
        Regex::new(r"Pa[ií]s\s+de\s+expedici[oó]n[:\s]*([A-Z]{3})\b").unwrap(),
        Regex::new(r"Staat\s+der\s+Ausstellung[:\s]*([A-Z]{3})\b").unwrap(),
    ];
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdCardStrategy;

impl ExtractionStrategy for IdCardStrategy {
    fn name(&self) -> &'static str {
        "ID"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        let mrz = input.mrz;

        result.expiration_date = resolve_checked_expiration(input, &mut result);

        result.number = match mrz.and_then(|m| m.number()) {
            Some(number) => Some(number.to_string()),
            None => resolve_number(input.text, None, NumberProfile::id_card()),
        };

        result.issued_country = mrz
            .and_then(|m| m.country())
            .filter(|code| is_valid_country_code(code))
            .map(str::to_string)
            .or_else(|| country_from_patterns(input.text, &COUNTRY_PATTERNS))
            .or_else(|| find_country_name(input.text).map(str::to_string));

        debug!(
            "ID card fields: number={:?} country={:?} expiry={:?}",
            result.number, result.issued_country, result.expiration_date
        );
        fill_gaps(result, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const DNI: &str = "REINO DE ESPAÑA\nDOCUMENTO NACIONAL DE IDENTIDAD\nN° 12345678Z\nVALIDEZ 01/01/2030";

    #[test]
    fn test_spanish_dni() {
        let input = ExtractionInput::new(DNI).with_today(ymd(2025, 1, 1));
        let result = IdCardStrategy.extract(&input);
        assert_eq!(result.number.as_deref(), Some("12345678Z"));
        assert_eq!(result.issued_country.as_deref(), Some("ESP"));
        assert_eq!(result.expiration_date, Some(ymd(2030, 1, 1)));
        assert!(result.is_valid());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let strategy = IdCardStrategy;
        let input = ExtractionInput::new(DNI).with_today(ymd(2025, 1, 1));
        let first = strategy.extract(&input);
        let second = strategy.extract(&input);
        assert_eq!(first, second);
        assert_eq!(second.confidence, 1.0);
    }

    #[test]
    fn test_german_id_card() {
        let text = "BUNDESREPUBLIK DEUTSCHLAND\nPERSONALAUSWEIS\nNummer C01234567\nGültig bis 10.10.2029";
        let result = IdCardStrategy.extract(&ExtractionInput::new(text).with_today(ymd(2025, 1, 1)));
        assert_eq!(result.number.as_deref(), Some("C01234567"));
        assert_eq!(result.issued_country.as_deref(), Some("DEU"));
        assert_eq!(result.expiration_date, Some(ymd(2029, 10, 10)));
    }

    #[test]
    fn test_explicit_code_beats_country_name() {
        let text = "REPUBLIQUE FRANCAISE\nNationality: BEL\nN° 123456789012";
        let result = IdCardStrategy.extract(&ExtractionInput::new(text).with_today(ymd(2025, 1, 1)));
        assert_eq!(result.issued_country.as_deref(), Some("BEL"));
        assert_eq!(result.number.as_deref(), Some("123456789012"));
    }

    #[test]
    fn test_far_future_expiry_is_kept_with_warning() {
        let text = "REINO DE ESPAÑA\nN° 12345678Z\nVALIDEZ 01/01/2060";
        let result = IdCardStrategy.extract(&ExtractionInput::new(text).with_today(ymd(2025, 1, 1)));
        assert_eq!(result.expiration_date, Some(ymd(2060, 1, 1)));
        assert_eq!(result.warnings, vec!["Suspiciously far future date: 2060-01-01".to_string()]);
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }
}
