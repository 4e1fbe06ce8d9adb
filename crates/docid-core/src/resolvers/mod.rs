//! Candidate resolvers for the three target fields.
//!
//! Each resolver scans OCR text, collects scored [`Candidate`]s and picks a
//! winner. Candidates never leave the resolver that produced them.

pub mod countries;
pub mod country;
pub mod dates;
pub mod number;
pub mod text;

pub use countries::{find_country_name, is_iso_alpha3, is_valid_country_code};
pub use country::{CountrySource, resolve_country};
pub use dates::{
    ExpirySource, ResolvedDate, expand_two_digit_year, is_far_future, parse_loose_date,
    parse_mrz_date, resolve_expiration,
};
pub use number::{NumberProfile, resolve_number};
pub use text::{collapse_whitespace, fold_upper};

/// Score given to a value that came straight from MRZ data.
pub const MRZ_SCORE: f32 = 10.0;

/// Lines mentioning these are about the holder, not the document.
const DENYLIST_CONTEXTS: &[&str] = &["DATE OF BIRTH", "PLACE OF BIRTH"];

/// How much a pattern match is trusted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Anchored to a label or MRZ structure.
    Strict,
    /// Bare format with no surrounding context.
    Fuzzy,
}

impl PatternKind {
    fn weight(self) -> f32 {
        match self {
            PatternKind::Strict => 3.0,
            PatternKind::Fuzzy => 1.0,
        }
    }
}

/// A provisional field value with its heuristic score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub value: T,
    pub score: f32,
    /// Where the value came from (a line of text, or "MRZ").
    pub source: String,
}

impl<T> Candidate<T> {
    pub fn new(value: T, score: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            score,
            source: source.into(),
        }
    }
}

/// Score a match found on `line`, the `position`-th of `total` lines.
///
/// `5·keyword + {3 strict | 1 fuzzy} + max(0, 2 − position/total) − 5·denylisted`
pub fn score_candidate(
    line: &str,
    keywords: &[&str],
    kind: PatternKind,
    position: usize,
    total: usize,
) -> f32 {
    let folded = fold_upper(line);
    let mut score = kind.weight();

    if keywords.iter().any(|k| folded.contains(&fold_upper(k))) {
        score += 5.0;
    }

    score += (2.0 - position as f32 / total.max(1) as f32).max(0.0);

    if DENYLIST_CONTEXTS.iter().any(|c| folded.contains(c)) {
        score -= 5.0;
    }

    score
}

/// Highest-scoring candidate; ties go to the one seen first.
pub fn best<T>(candidates: Vec<Candidate<T>>) -> Option<Candidate<T>> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.score >= candidate.score => Some(b),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_score_strict_with_keyword() {
        let score = score_candidate("PASSPORT NO: X1234567", &["PASSPORT NO"], PatternKind::Strict, 0, 4);
        assert_eq!(score, 5.0 + 3.0 + 2.0);
    }

    #[test]
    fn test_score_position_decays() {
        let first = score_candidate("A1234567", &[], PatternKind::Fuzzy, 0, 4);
        let last = score_candidate("A1234567", &[], PatternKind::Fuzzy, 3, 4);
        assert_eq!(first, 3.0);
        assert_eq!(last, 1.0 + 2.0 - 0.75);
    }

    #[test]
    fn test_score_birth_context_penalized() {
        let score = score_candidate("Date of Birth 01 JAN 1990", &[], PatternKind::Fuzzy, 0, 1);
        assert_eq!(score, 1.0 + 2.0 - 5.0);
    }

    #[test]
    fn test_keyword_match_ignores_diacritics() {
        let score = score_candidate("Número 123456", &["NUMERO"], PatternKind::Strict, 0, 1);
        assert_eq!(score, 10.0);
    }

    #[test]
    fn test_best_prefers_first_on_tie() {
        let winner = best(vec![
            Candidate::new("a", 3.0, "x"),
            Candidate::new("b", 3.0, "y"),
            Candidate::new("c", 1.0, "z"),
        ]);
        assert_eq!(winner.map(|c| c.value), Some("a"));
        assert_eq!(best::<&str>(Vec::new()), None);
    }
}
