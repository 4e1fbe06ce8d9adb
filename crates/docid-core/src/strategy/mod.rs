//! Extraction strategies.
//!
//! A strategy turns OCR text plus optional MRZ data into one
//! [`ExtractionResult`]. Strategies hold no per-call state: every `extract`
//! builds a fresh result, so an instance can be reused and shared.

pub mod chain;
pub mod checks;
pub mod country;
pub mod generic;
pub mod id_card;
pub mod mrz;
pub mod registry;
pub mod visa;

pub use chain::StrategyChain;
pub use checks::NumberKind;
pub use country::{EgyptianPassportStrategy, EuDocumentStrategy, SpanishPassportStrategy, UsPassportStrategy};
pub use generic::GenericStrategy;
pub use id_card::IdCardStrategy;
pub use mrz::MrzStrategy;
pub use registry::{StrategyRegistry, get_strategy};
pub use visa::VisaStrategy;

use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::models::ExtractionResult;
use crate::mrz::MrzRecord;
use crate::resolvers::{is_far_future, resolve_expiration};

/// Everything a strategy may look at for one document.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub text: &'a str,
    pub mrz: Option<&'a MrzRecord>,
    /// Document on disk, for strategies that hand it to an external reader.
    pub file_path: Option<&'a Path>,
    /// Reference date for "in the future" checks.
    pub today: NaiveDate,
}

impl<'a> ExtractionInput<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            mrz: None,
            file_path: None,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_mrz(mut self, mrz: Option<&'a MrzRecord>) -> Self {
        self.mrz = mrz;
        self
    }

    pub fn with_file(mut self, path: Option<&'a Path>) -> Self {
        self.file_path = path;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// MRZ expiration as `YYMMDD`, when known.
    pub fn mrz_expiration(&self) -> Option<String> {
        self.mrz.and_then(MrzRecord::expiration_yymmdd)
    }
}

/// One way of pulling the target fields out of a document.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs and registry lookups.
    fn name(&self) -> &'static str;

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult;

    /// Whether this strategy wants the document as a file on disk.
    fn requires_file(&self) -> bool {
        false
    }
}

/// First valid country code captured by any of `patterns`, in pattern order.
pub(crate) fn country_from_patterns(text: &str, patterns: &[regex::Regex]) -> Option<String> {
    patterns
        .iter()
        .flat_map(|regex| regex.captures_iter(text))
        .map(|caps| caps[1].to_string())
        .find(|code| crate::resolvers::is_valid_country_code(code))
}

/// Resolve the expiration date, warning on `result` when it lies more than
/// twenty years ahead. The date is returned either way.
pub(crate) fn resolve_checked_expiration(
    input: &ExtractionInput<'_>,
    result: &mut ExtractionResult,
) -> Option<NaiveDate> {
    let resolved = resolve_expiration(input.text, input.mrz_expiration().as_deref(), input.today)?;
    if is_far_future(resolved.date, input.today) {
        result.add_warning(format!("Suspiciously far future date: {}", resolved.date));
    }
    tracing::debug!("Expiration {} ({:?})", resolved.date, resolved.source);
    Some(resolved.date)
}

/// Merge the generic resolvers in when `result` still misses a field.
pub(crate) fn fill_gaps(result: ExtractionResult, input: &ExtractionInput<'_>) -> ExtractionResult {
    if !result.has_gaps() {
        return result;
    }
    tracing::debug!("Result incomplete, merging generic resolvers");
    result.merge(GenericStrategy.extract(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TEXT: &str = "PASSPORT NO X1234567\nNATIONALITY FRA\nDATE OF EXPIRY 01/01/2060";

    #[test]
    fn test_fill_gaps_leaves_complete_result() {
        let input = ExtractionInput::new(TEXT).with_today(ymd(2025, 1, 1));
        let complete = ExtractionResult::new()
            .with_number("AB123456")
            .with_country("ESP")
            .with_expiration(ymd(2030, 1, 1));
        assert!(!complete.has_gaps());
        assert_eq!(fill_gaps(complete.clone(), &input), complete);
    }

    #[test]
    fn test_fill_gaps_merges_generic() {
        let input = ExtractionInput::new(TEXT).with_today(ymd(2025, 1, 1));
        let partial = ExtractionResult::new().with_number("AB123456");
        assert!(partial.has_gaps());

        let filled = fill_gaps(partial, &input);
        assert_eq!(filled.number.as_deref(), Some("AB123456"));
        assert_eq!(filled.issued_country.as_deref(), Some("FRA"));
        assert_eq!(filled.expiration_date, Some(ymd(2060, 1, 1)));
    }

    #[test]
    fn test_checked_expiration_warns_far_ahead() {
        let input = ExtractionInput::new(TEXT).with_today(ymd(2025, 1, 1));
        let mut result = ExtractionResult::new();
        assert_eq!(resolve_checked_expiration(&input, &mut result), Some(ymd(2060, 1, 1)));
        assert_eq!(result.warnings, vec!["Suspiciously far future date: 2060-01-01".to_string()]);

        let near = ExtractionInput::new("DATE OF EXPIRY 01/01/2030").with_today(ymd(2025, 1, 1));
        let mut result = ExtractionResult::new();
        assert_eq!(resolve_checked_expiration(&near, &mut result), Some(ymd(2030, 1, 1)));
        assert!(result.warnings.is_empty());
    }
}
