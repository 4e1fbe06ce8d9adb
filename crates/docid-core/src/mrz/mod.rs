//! Machine-readable zone handling.
//!
//! An [`MrzRecord`] is built once per extraction, either from a reader scan
//! or from MRZ fields the caller already has. Failures degrade to `None`.

pub mod parser;
pub mod reader;

pub use parser::{MrzFormat, MrzScan, check_digit, find_mrz_lines, parse_lines, scan_text};
pub use reader::{MrzReader, OcrMrzReader};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MrzError;
use crate::resolvers::dates::{parse_loose_date, parse_mrz_date};

/// Minimum reader score (0 to 100) for a scan to be used at all.
pub const DEFAULT_MIN_SCORE: u8 = 50;

/// Canonical MRZ data for one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MrzRecord {
    pub document_type: String,
    /// Three-letter code, or empty.
    pub country_code: String,
    pub number: String,
    pub expiration_date: Option<NaiveDate>,
    /// Expiration exactly as supplied, kept for re-parsing.
    pub expiration_date_raw: Option<String>,
}

/// Expiration date supplied by the caller: a date or any string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMrzDate {
    Date(NaiveDate),
    Text(String),
}

/// MRZ fields pre-extracted by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMrz {
    pub document_type: Option<String>,
    pub issuing_state: Option<String>,
    pub number: Option<String>,
    pub expiration_date: Option<RawMrzDate>,
    /// Expiration as originally printed; read only when `expiration_date` is absent.
    pub expiration_date_str: Option<String>,
}

fn normalize_country(raw: &str) -> String {
    let code = raw.trim().replace('<', "").to_uppercase();
    if code == "D" { "DEU".to_string() } else { code }
}

/// Parsed date (if readable) and the trimmed raw text.
fn raw_expiration(text: &str, today: NaiveDate) -> (Option<NaiveDate>, Option<String>) {
    let text = text.trim();
    let date = parse_mrz_date(text).or_else(|| parse_loose_date(text, today));
    if date.is_none() {
        debug!("Could not parse MRZ expiration {:?}", text);
    }
    (date, Some(text.to_string()))
}

fn clean_field(raw: Option<&str>) -> String {
    raw.map(|s| s.trim().trim_matches('<').to_uppercase()).unwrap_or_default()
}

impl MrzRecord {
    /// Build from a reader scan, discarding it entirely below `min_score`.
    pub fn from_scan(scan: &MrzScan, min_score: u8) -> Result<Self, MrzError> {
        if scan.valid_score < min_score {
            return Err(MrzError::LowScore {
                score: scan.valid_score,
                threshold: min_score,
            });
        }

        let expiration_date = parse_mrz_date(&scan.expiration_raw);
        if expiration_date.is_none() {
            debug!("MRZ expiration {:?} is not a valid YYMMDD date", scan.expiration_raw);
        }

        Ok(Self {
            document_type: scan.document_type.clone(),
            country_code: normalize_country(&scan.country),
            number: scan.number.clone(),
            expiration_date,
            expiration_date_raw: Some(scan.expiration_raw.clone()),
        })
    }

    /// Build from caller-supplied fields.
    ///
    /// Six-digit strings are read as `YYMMDD`; anything else goes through the
    /// permissive date parser. An unreadable date is dropped but its raw text
    /// is kept.
    pub fn from_raw(raw: &RawMrz, today: NaiveDate) -> Result<Self, MrzError> {
        let number = clean_field(raw.number.as_deref());
        let country_code = raw.issuing_state.as_deref().map(normalize_country).unwrap_or_default();

        let (expiration_date, expiration_date_raw) =
            match (&raw.expiration_date, raw.expiration_date_str.as_deref()) {
                (Some(RawMrzDate::Date(date)), _) => (Some(*date), Some(date.format("%y%m%d").to_string())),
                (Some(RawMrzDate::Text(text)), _) => raw_expiration(text, today),
                (None, Some(text)) => raw_expiration(text, today),
                (None, None) => (None, None),
            };

        if number.is_empty() && country_code.is_empty() && expiration_date_raw.is_none() {
            return Err(MrzError::Malformed("no MRZ fields supplied".to_string()));
        }

        Ok(Self {
            document_type: clean_field(raw.document_type.as_deref()),
            country_code,
            number,
            expiration_date,
            expiration_date_raw,
        })
    }

    pub fn number(&self) -> Option<&str> {
        Some(self.number.as_str()).filter(|n| !n.is_empty())
    }

    pub fn country(&self) -> Option<&str> {
        Some(self.country_code.as_str()).filter(|c| !c.is_empty())
    }

    /// Expiration as `YYMMDD`, from the raw string when it already is one.
    pub fn expiration_yymmdd(&self) -> Option<String> {
        match &self.expiration_date_raw {
            Some(raw) if parse_mrz_date(raw).is_some() => Some(raw.clone()),
            _ => self.expiration_date.map(|d| d.format("%y%m%d").to_string()),
        }
    }
}

/// Turns MRZ sources into records, logging and swallowing failures.
#[derive(Debug, Clone, Copy)]
pub struct MrzNormalizer {
    min_score: u8,
}

impl MrzNormalizer {
    pub fn new(min_score: u8) -> Self {
        Self { min_score }
    }

    pub fn normalize_scan(&self, scan: &MrzScan) -> Option<MrzRecord> {
        match MrzRecord::from_scan(scan, self.min_score) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Discarding MRZ scan: {}", e);
                None
            }
        }
    }

    pub fn normalize_raw(&self, raw: &RawMrz, today: NaiveDate) -> Option<MrzRecord> {
        match MrzRecord::from_raw(raw, today) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring supplied MRZ: {}", e);
                None
            }
        }
    }

    /// Detect MRZ lines in OCR text and normalize them.
    pub fn normalize_text(&self, text: &str) -> Option<MrzRecord> {
        match scan_text(text) {
            Ok(Some(scan)) => self.normalize_scan(&scan),
            Ok(None) => None,
            Err(e) => {
                debug!("No usable MRZ in text: {}", e);
                None
            }
        }
    }
}

impl Default for MrzNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scan(score: u8) -> MrzScan {
        MrzScan {
            format: MrzFormat::Td3,
            document_type: "P".to_string(),
            country: "D".to_string(),
            number: "C01X00T47".to_string(),
            expiration_raw: "310430".to_string(),
            valid_score: score,
        }
    }

    #[test]
    fn test_from_scan() {
        let record = MrzRecord::from_scan(&scan(100), 50).unwrap();
        assert_eq!(record.country_code, "DEU");
        assert_eq!(record.expiration_date, Some(ymd(2031, 4, 30)));
        assert_eq!(record.expiration_yymmdd(), Some("310430".to_string()));
    }

    #[test]
    fn test_low_score_discards_whole_scan() {
        assert!(matches!(
            MrzRecord::from_scan(&scan(49), 50),
            Err(MrzError::LowScore { score: 49, threshold: 50 })
        ));
        assert_eq!(MrzNormalizer::default().normalize_scan(&scan(25)), None);
        assert!(MrzNormalizer::default().normalize_scan(&scan(50)).is_some());
    }

    #[test]
    fn test_from_raw_json() {
        let raw: RawMrz = serde_json::from_str(
            r#"{"document_type": "P<", "issuing_state": "esp", "number": "PAA123456", "expiration_date": "300615"}"#,
        )
        .unwrap();
        let record = MrzRecord::from_raw(&raw, ymd(2025, 1, 1)).unwrap();
        assert_eq!(record.document_type, "P");
        assert_eq!(record.country(), Some("ESP"));
        assert_eq!(record.number(), Some("PAA123456"));
        assert_eq!(record.expiration_date, Some(ymd(2030, 6, 15)));
    }

    #[test]
    fn test_from_raw_expiration_string_fallback() {
        let today = ymd(2025, 1, 1);
        let raw: RawMrz =
            serde_json::from_str(r#"{"number": "A25886431", "expiration_date_str": "290615"}"#).unwrap();
        let record = MrzRecord::from_raw(&raw, today).unwrap();
        assert_eq!(record.expiration_date, Some(ymd(2029, 6, 15)));
        assert_eq!(record.expiration_date_raw.as_deref(), Some("290615"));

        // A structured date takes precedence over the printed string.
        let raw: RawMrz = serde_json::from_str(
            r#"{"number": "A25886431", "expiration_date": "2031-02-03", "expiration_date_str": "290615"}"#,
        )
        .unwrap();
        let record = MrzRecord::from_raw(&raw, today).unwrap();
        assert_eq!(record.expiration_date, Some(ymd(2031, 2, 3)));
    }

    #[test]
    fn test_from_raw_date_value() {
        let raw: RawMrz = serde_json::from_str(r#"{"number": "X1", "expiration_date": "2031-02-03"}"#).unwrap();
        assert_eq!(raw.expiration_date, Some(RawMrzDate::Date(ymd(2031, 2, 3))));
        let record = MrzRecord::from_raw(&raw, ymd(2025, 1, 1)).unwrap();
        assert_eq!(record.expiration_yymmdd(), Some("310203".to_string()));
        assert_eq!(record.country(), None);
    }

    #[test]
    fn test_from_raw_loose_and_unreadable_dates() {
        let today = ymd(2025, 1, 1);
        let raw = RawMrz {
            number: Some("X1".to_string()),
            expiration_date: Some(RawMrzDate::Text("15 MAR 2029".to_string())),
            ..Default::default()
        };
        assert_eq!(MrzRecord::from_raw(&raw, today).unwrap().expiration_date, Some(ymd(2029, 3, 15)));

        let raw = RawMrz {
            number: Some("X1".to_string()),
            expiration_date: Some(RawMrzDate::Text("soon".to_string())),
            ..Default::default()
        };
        let record = MrzRecord::from_raw(&raw, today).unwrap();
        assert_eq!(record.expiration_date, None);
        assert_eq!(record.expiration_date_raw, Some("soon".to_string()));
        assert_eq!(record.expiration_yymmdd(), None);
    }

    #[test]
    fn test_empty_raw_degrades_to_none() {
        let normalizer = MrzNormalizer::default();
        assert_eq!(normalizer.normalize_raw(&RawMrz::default(), ymd(2025, 1, 1)), None);
    }

    #[test]
    fn test_normalize_text() {
        let text = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\nL898902C36UTO7408122F1204159ZE184226B<<<<<10";
        let record = MrzNormalizer::default().normalize_text(text).unwrap();
        assert_eq!(record.number, "L898902C3");
        assert_eq!(record.expiration_date, Some(ymd(2012, 4, 15)));
        assert_eq!(MrzNormalizer::default().normalize_text("nothing"), None);
    }
}
