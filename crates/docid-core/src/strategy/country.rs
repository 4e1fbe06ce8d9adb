//! Country-specialized passport and ID strategies.
//!
//! Each one prefers MRZ values, falls back to its own layout-specific
//! patterns, and validates everything it keeps. The passport strategies
//! report a fixed issuing country.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::checks::{NumberKind, check_country, check_date, looks_valid_number, parse_validated_date};
use super::{ExtractionInput, ExtractionStrategy};
use crate::models::ExtractionResult;

lazy_static! {
    static ref ESP_NUMBER: Regex = Regex::new(r"\b[A-Z]\d{7}[A-Z]\b").unwrap();
    static ref ESP_EXPIRY: Regex = Regex::new(
        r"(?i)(?:V[AÁ]LIDO\s+HASTA|VALIDEZ)[:\s]*([0-3]?\d[/.-]\d{1,2}[/.-]\d{2,4})"
    ).unwrap();

    static ref EGY_MRZ_LINE: Regex = Regex::new(r"(?m)P<EGY[A-Z<]*$").unwrap();
    static ref EGY_MRZ_NUMBER: Regex = Regex::new(r"^([A-Z]\d{8})").unwrap();
    static ref EGY_NUMBER: Regex = Regex::new(r"\b[A-Z]\d{8}\b").unwrap();

    static ref EU_NUMBER: Regex = Regex::new(r"\b[CDEFGL][0-9A-Z]{8}\b").unwrap();
    static ref EU_EXPIRY: Regex = Regex::new(
        r"(?i)(?:G[UÜ]LTIG\s+BIS|VALABLE\s+JUSQU['’]AU|V[AÁ]LIDO\s+HASTA)[:\s]*([0-3]?\d[./][01]?\d[./]\d{2,4})"
    ).unwrap();

    static ref USA_MRZ_LINE: Regex = Regex::new(r"(?m)P<USA[A-Z<]*$").unwrap();
    static ref USA_MRZ_NUMBER: Regex = Regex::new(r"^([A-Z0-9]{9})").unwrap();

    /// TD3 line 2 up to the expiration: check digit, nationality, birth date, sex.
    static ref MRZ_LINE2_EXPIRY: Regex = Regex::new(r"\d[A-Z]{3}\d{7}[MFX<](\d{6})").unwrap();
}

/// MRZ number, kept only if it passes the format check for `kind`.
fn mrz_number(input: &ExtractionInput<'_>, kind: NumberKind, result: &mut ExtractionResult) -> Option<String> {
    let number = input.mrz?.number()?;
    if looks_valid_number(number, kind, result) {
        debug!("Using number from MRZ: {}", number);
        Some(number.to_string())
    } else {
        debug!("Rejected MRZ number {}", number);
        None
    }
}

/// MRZ expiration, validated; a resolved date wins over the raw string.
fn mrz_expiration(input: &ExtractionInput<'_>, result: &mut ExtractionResult) -> Option<NaiveDate> {
    let mrz = input.mrz?;
    if let Some(date) = mrz.expiration_date {
        return check_date(date, input.today, result).then_some(date);
    }
    let raw = mrz.expiration_date_raw.as_deref()?;
    parse_validated_date(raw, input.today, result)
}

fn validated_number(candidate: &str, kind: NumberKind, result: &mut ExtractionResult) -> Option<String> {
    looks_valid_number(candidate, kind, result).then(|| candidate.to_string())
}

/// The line after the first match of `header`.
fn line_after<'t>(text: &'t str, header: &Regex) -> Option<&'t str> {
    let found = header.find(text)?;
    text[found.end()..].lines().nth(1).map(str::trim)
}

fn fixed_country(code: &str, result: &mut ExtractionResult) -> Option<String> {
    check_country(code, result).then(|| code.to_string())
}

/// Spanish passports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanishPassportStrategy;

impl ExtractionStrategy for SpanishPassportStrategy {
    fn name(&self) -> &'static str {
        "ESP"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        result.number = if input.mrz.and_then(|m| m.number()).is_some() {
            mrz_number(input, NumberKind::Passport, &mut result)
        } else {
            ESP_NUMBER
                .find(input.text)
                .and_then(|m| validated_number(m.as_str(), NumberKind::Passport, &mut result))
        };

        result.expiration_date = match mrz_expiration(input, &mut result) {
            Some(date) => Some(date),
            None => ESP_EXPIRY
                .captures(input.text)
                .and_then(|caps| parse_validated_date(&caps[1], input.today, &mut result)),
        };

        result.issued_country = fixed_country("ESP", &mut result);
        result
    }
}

/// Egyptian passports.
#[derive(Debug, Clone, Copy, Default)]
pub struct EgyptianPassportStrategy;

impl ExtractionStrategy for EgyptianPassportStrategy {
    fn name(&self) -> &'static str {
        "EGY"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        let text = input.text;

        result.number = mrz_number(input, NumberKind::Passport, &mut result);
        if result.number.is_none() {
            let from_mrz_line = line_after(text, &EGY_MRZ_LINE)
                .and_then(|line| EGY_MRZ_NUMBER.captures(line))
                .and_then(|caps| validated_number(&caps[1], NumberKind::Passport, &mut result));
            result.number = match from_mrz_line {
                Some(number) => Some(number),
                None => EGY_NUMBER
                    .find(text)
                    .and_then(|m| validated_number(m.as_str(), NumberKind::Passport, &mut result)),
            };
        }

        result.expiration_date = match mrz_expiration(input, &mut result) {
            Some(date) => Some(date),
            None => MRZ_LINE2_EXPIRY
                .captures(text)
                .and_then(|caps| parse_validated_date(&caps[1], input.today, &mut result)),
        };

        result.issued_country = fixed_country("EGY", &mut result);
        result
    }
}

/// EU identity documents; the issuing country comes only from the MRZ.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuDocumentStrategy;

impl ExtractionStrategy for EuDocumentStrategy {
    fn name(&self) -> &'static str {
        "EU"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        let text = input.text;

        result.number = match mrz_number(input, NumberKind::IdCard, &mut result) {
            Some(number) => Some(number),
            // Require a digit so words like DOCUMENTO are not numbers.
            None => EU_NUMBER
                .find_iter(text)
                .find(|m| m.as_str().chars().any(|c| c.is_ascii_digit()))
                .and_then(|m| validated_number(m.as_str(), NumberKind::IdCard, &mut result)),
        };

        result.expiration_date = match mrz_expiration(input, &mut result) {
            Some(date) => Some(date),
            None => EU_EXPIRY
                .captures(text)
                .and_then(|caps| parse_validated_date(&caps[1], input.today, &mut result)),
        };

        if let Some(code) = input.mrz.and_then(|m| m.country()) {
            result.issued_country = fixed_country(code, &mut result);
        }
        result
    }
}

/// United States passports.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsPassportStrategy;

impl ExtractionStrategy for UsPassportStrategy {
    fn name(&self) -> &'static str {
        "USA"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        result.number = mrz_number(input, NumberKind::Passport, &mut result);
        result.expiration_date = mrz_expiration(input, &mut result);

        if result.number.is_none() || result.expiration_date.is_none() {
            match line_after(input.text, &USA_MRZ_LINE) {
                Some(line) => {
                    debug!("Found US MRZ line 2: {}", line);
                    if result.number.is_none() {
                        result.number = USA_MRZ_NUMBER
                            .captures(line)
                            .and_then(|caps| validated_number(&caps[1], NumberKind::Passport, &mut result));
                    }
                    if result.expiration_date.is_none() {
                        result.expiration_date = MRZ_LINE2_EXPIRY
                            .captures(line)
                            .and_then(|caps| parse_validated_date(&caps[1], input.today, &mut result));
                    }
                }
                None => debug!("No US MRZ line in text"),
            }
        }

        result.issued_country = fixed_country("USA", &mut result);
        result
    }
}
