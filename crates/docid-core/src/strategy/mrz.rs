//! MRZ-preferring strategy.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ExtractionInput, ExtractionStrategy, GenericStrategy};
use crate::models::ExtractionResult;
use crate::mrz::{DEFAULT_MIN_SCORE, MrzReader, MrzRecord};
use crate::resolvers::is_valid_country_code;

/// Takes fields from the MRZ and fills the rest from [`GenericStrategy`].
///
/// With a reader configured and a file available, the MRZ is read straight
/// from the file; a scan below the minimum score discards the whole attempt.
/// Otherwise the record already on the input is used.
pub struct MrzStrategy {
    reader: Option<Arc<dyn MrzReader>>,
    min_score: u8,
}

/// Outcome of reading the MRZ from the document file.
enum FileRead {
    Found(MrzRecord),
    /// The reader ran and its scan must be thrown away.
    Rejected,
    Unavailable,
}

impl MrzStrategy {
    pub fn new() -> Self {
        Self {
            reader: None,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn MrzReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    fn read_file(&self, input: &ExtractionInput<'_>) -> FileRead {
        let (Some(reader), Some(path)) = (&self.reader, input.file_path) else {
            return FileRead::Unavailable;
        };

        match reader.read_file(path) {
            Ok(Some(scan)) => match MrzRecord::from_scan(&scan, self.min_score) {
                Ok(record) => FileRead::Found(record),
                Err(e) => {
                    warn!("Discarding MRZ read from {}: {}", path.display(), e);
                    FileRead::Rejected
                }
            },
            Ok(None) => {
                debug!("No MRZ found in {}", path.display());
                FileRead::Unavailable
            }
            Err(e) => {
                warn!("MRZ reader failed on {}: {}", path.display(), e);
                FileRead::Rejected
            }
        }
    }
}

impl Default for MrzStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for MrzStrategy {
    fn name(&self) -> &'static str {
        "MRZ"
    }

    fn requires_file(&self) -> bool {
        self.reader.is_some()
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> ExtractionResult {
        let scanned = match self.read_file(input) {
            FileRead::Found(record) => Some(record),
            FileRead::Rejected => return ExtractionResult::new(),
            FileRead::Unavailable => None,
        };
        let Some(record) = scanned.as_ref().or(input.mrz) else {
            debug!("No MRZ available, using generic resolvers");
            return GenericStrategy.extract(input);
        };

        let mut result = ExtractionResult::new();
        result.number = record.number().map(str::to_string);

        match record.country() {
            Some(code) if is_valid_country_code(code) => result.issued_country = Some(code.to_string()),
            Some(code) => warn!("Invalid country code from MRZ: {}", code),
            None => {}
        }

        match record.expiration_date {
            Some(date) if date >= input.today => result.expiration_date = Some(date),
            Some(date) => warn!("MRZ expiration {} is in the past", date),
            None => {}
        }

        if result.is_complete() {
            return result;
        }

        debug!("MRZ result incomplete, filling from generic resolvers");
        let input = ExtractionInput {
            mrz: Some(record),
            ..*input
        };
        let generic = GenericStrategy.extract(&input);
        ExtractionResult {
            number: result.number.or(generic.number),
            issued_country: result.issued_country.or(generic.issued_country),
            expiration_date: result.expiration_date.or(generic.expiration_date),
            ..result
        }
    }
}
