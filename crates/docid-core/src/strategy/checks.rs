//! Field validation shared by the specialized strategies.
//!
//! Checks record their findings on the result being built and report
//! whether the value may be used.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::ExtractionResult;
use crate::resolvers::countries::is_valid_country_code;
use crate::resolvers::dates::{is_far_future, parse_loose_date, parse_mrz_date};

lazy_static! {
    static ref PASSPORT_NUMBER: Regex = Regex::new(r"^[A-Z0-9]{6,10}$").unwrap();
    static ref ID_CARD_NUMBER: Regex = Regex::new(r"^[A-Z0-9]{6,12}$").unwrap();
    static ref VISA_NUMBER: Regex = Regex::new(r"^[0-9]{8,9}$").unwrap();
}

/// Document family a number is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Passport,
    IdCard,
    Visa,
    Generic,
}

/// Check a document number; format misses are errors except for `Generic`.
pub fn looks_valid_number(number: &str, kind: NumberKind, result: &mut ExtractionResult) -> bool {
    if number.trim().is_empty() {
        result.add_error("Number is empty or whitespace");
        return false;
    }

    let mut chars = number.chars();
    let first = chars.next();
    if number.len() > 2 && number.chars().all(|c| c.is_ascii_digit()) && chars.all(|c| Some(c) == first) {
        result.add_error(format!("Number contains all same digits: {}", number));
        return false;
    }

    let (pattern, label) = match kind {
        NumberKind::Passport => (&*PASSPORT_NUMBER, "passport"),
        NumberKind::IdCard => (&*ID_CARD_NUMBER, "ID card"),
        NumberKind::Visa => (&*VISA_NUMBER, "visa"),
        NumberKind::Generic => {
            if !ID_CARD_NUMBER.is_match(number) {
                result.add_warning(format!("Number format may be invalid: {}", number));
            }
            return true;
        }
    };

    if pattern.is_match(number) {
        true
    } else {
        result.add_error(format!("Invalid {} number format: {}", label, number));
        false
    }
}

/// Check an issuing country code.
pub fn check_country(code: &str, result: &mut ExtractionResult) -> bool {
    if is_valid_country_code(code) {
        true
    } else {
        result.add_error(format!("Invalid country code: {}", code));
        false
    }
}

/// Reject past dates; warn about implausibly distant ones.
pub fn check_date(date: NaiveDate, today: NaiveDate, result: &mut ExtractionResult) -> bool {
    if date < today {
        result.add_error(format!("Date {} is in the past", date));
        return false;
    }
    if is_far_future(date, today) {
        result.add_warning(format!("Suspiciously far future date: {}", date));
    }
    true
}

/// Parse a date string (`YYMMDD` or any loose format) and validate it.
pub fn parse_validated_date(raw: &str, today: NaiveDate, result: &mut ExtractionResult) -> Option<NaiveDate> {
    let raw = raw.trim();
    let Some(date) = parse_mrz_date(raw).or_else(|| parse_loose_date(raw, today)) else {
        result.add_error(format!("Could not parse date from string '{}'", raw));
        return None;
    };
    debug!("Parsed {:?} as {}", raw, date);
    check_date(date, today, result).then_some(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_looks_valid_number_formats() {
        let mut result = ExtractionResult::new();
        assert!(looks_valid_number("PAA123456", NumberKind::Passport, &mut result));
        assert!(looks_valid_number("12345678Z", NumberKind::IdCard, &mut result));
        assert!(looks_valid_number("202312345", NumberKind::Visa, &mut result));
        assert!(result.is_valid());

        assert!(!looks_valid_number("AB-12", NumberKind::Passport, &mut result));
        assert!(!looks_valid_number("A12345678", NumberKind::Visa, &mut result));
        assert_eq!(
            result.validation_errors,
            vec![
                "Invalid passport number format: AB-12".to_string(),
                "Invalid visa number format: A12345678".to_string(),
            ]
        );
    }

    #[test]
    fn test_repeated_digits_rejected() {
        let mut result = ExtractionResult::new();
        assert!(!looks_valid_number("00000000", NumberKind::IdCard, &mut result));
        assert_eq!(result.validation_errors, vec!["Number contains all same digits: 00000000".to_string()]);
        assert!(looks_valid_number("AAAAAAA", NumberKind::Passport, &mut ExtractionResult::new()));
    }

    #[test]
    fn test_generic_only_warns() {
        let mut result = ExtractionResult::new();
        assert!(looks_valid_number("X-1", NumberKind::Generic, &mut result));
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_check_country() {
        let mut result = ExtractionResult::new();
        assert!(check_country("EGY", &mut result));
        assert!(!check_country("UTO", &mut result));
        assert_eq!(result.validation_errors, vec!["Invalid country code: UTO".to_string()]);
    }

    #[test]
    fn test_check_date() {
        let today = ymd(2025, 1, 1);
        let mut result = ExtractionResult::new();
        assert!(check_date(today, today, &mut result));
        assert!(check_date(ymd(2050, 1, 1), today, &mut result));
        assert_eq!(result.warnings, vec!["Suspiciously far future date: 2050-01-01".to_string()]);
        assert!(!check_date(ymd(2024, 12, 31), today, &mut result));
        assert_eq!(result.validation_errors, vec!["Date 2024-12-31 is in the past".to_string()]);
    }

    #[test]
    fn test_parse_validated_date() {
        let today = ymd(2025, 1, 1);
        let mut result = ExtractionResult::new();
        assert_eq!(parse_validated_date("300615", today, &mut result), Some(ymd(2030, 6, 15)));
        assert_eq!(parse_validated_date("01.02.2031", today, &mut result), Some(ymd(2031, 2, 1)));
        assert_eq!(parse_validated_date("01.02.2020", today, &mut result), None);
        assert_eq!(parse_validated_date("garbage", today, &mut result), None);
        assert_eq!(result.validation_errors.len(), 2);
    }
}
