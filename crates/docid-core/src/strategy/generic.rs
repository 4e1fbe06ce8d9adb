//! Last-resort strategy: the full resolvers with no document assumptions.

use tracing::debug;

use super::{ExtractionInput, ExtractionStrategy, resolve_checked_expiration};
use crate::models::ExtractionResult;
use crate::resolvers::{NumberProfile, resolve_country, resolve_number};

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl GenericStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "GEN"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        let mrz = input.mrz;

        result.expiration_date = resolve_checked_expiration(input, &mut result);
        result.number = resolve_number(input.text, mrz.and_then(|m| m.number()), NumberProfile::generic());
        result.issued_country = resolve_country(input.text, mrz.and_then(|m| m.country()));

        debug!(
            "Generic fields: number={:?} country={:?} expiry={:?}",
            result.number, result.issued_country, result.expiration_date
        );
        result
    }
}
