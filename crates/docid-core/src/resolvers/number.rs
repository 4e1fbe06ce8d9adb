//! Document number resolver.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use super::{Candidate, MRZ_SCORE, PatternKind, best, score_candidate};

/// A number pattern with its trust level.
#[derive(Debug)]
pub struct NumberPattern {
    pub regex: Regex,
    pub kind: PatternKind,
    /// Matched against a line joined with the next one.
    pub spans_lines: bool,
}

impl NumberPattern {
    fn strict(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            kind: PatternKind::Strict,
            spans_lines: false,
        }
    }

    fn fuzzy(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            kind: PatternKind::Fuzzy,
            spans_lines: false,
        }
    }

    fn across_lines(mut self) -> Self {
        self.spans_lines = true;
        self
    }
}

/// Ordered patterns and label keywords for one document family.
#[derive(Debug)]
pub struct NumberProfile {
    pub name: &'static str,
    pub patterns: Vec<NumberPattern>,
    pub keywords: &'static [&'static str],
}

lazy_static! {
    static ref GENERIC: NumberProfile = NumberProfile {
        name: "generic",
        patterns: vec![
            // MRZ-relative
            NumberPattern::strict(r"([A-Z0-9]{6,10})<*\d[A-Z]{3}\d{7}"),
            NumberPattern::strict(r"P<[A-Z]{3}[A-Z<]*<<[A-Z<]*\n([A-Z0-9]{6,9})<*\d[A-Z]{3}")
                .across_lines(),
            NumberPattern::strict(r"([A-Z0-9]{6,10})\s+\d[A-Z]{3}\d{7}"),
            // Labeled
            NumberPattern::strict(
                r"(?i)(?:PASSPORT\s+N[O°º]\.?|PASSPORT\s+NUMBER|PASAPORTE\s+N[O°º]\.?|DOCUMENT\s+N[O°º]\.?|DOCUMENT\s+NUMBER|DOC\s*N[O°º]\.?)[:\s]*([A-Z0-9]{6,12})",
            ),
            NumberPattern::strict(r"\bP\s+[A-Z]{3}\s+([A-Z0-9]{6,10})"),
            NumberPattern::strict(r"\b(?:ID\s+CARD|ID|TARJETA|PERMISO)\b[:\s]*([A-Z0-9]{6,10})\b"),
            NumberPattern::strict(r"(?:PASSPORT|PASZPORT)\s+[A-Z0-9]{1,2}\s+([A-Z0-9]{6,10})"),
            NumberPattern::strict(r"(?:TYPE|CODE)\s+[A-Z0-9]{1,2}\s+([A-Z0-9]{6,10})"),
            // Bare formats
            NumberPattern::fuzzy(r"\b[A-Z]\d{8}\b"),
            NumberPattern::fuzzy(r"\b[A-Z]\d{7}[A-Z]\b"),
            NumberPattern::fuzzy(r"\b[A-Z]\d{7}\b"),
            NumberPattern::fuzzy(r"\b[A-Z]{2}\d{7}\b"),
            NumberPattern::fuzzy(r"\b[A-Z]{3}\d{6}\b"),
            NumberPattern::fuzzy(r"\b[A-Z]\d{6}\b"),
        ],
        keywords: &[
            "PASSPORT NO",
            "PASSPORT NUMBER",
            "DOCUMENT NO",
            "DOCUMENT NUMBER",
            "PASAPORTE",
            "NUMERO",
            "DOC NO",
        ],
    };

    static ref ID_CARD: NumberProfile = NumberProfile {
        name: "id_card",
        patterns: vec![
            NumberPattern::strict(
                r"(?i)\b(?:N[°º]|NO\.|NUM\.?|N[UÚ]MERO|NUMBER|NUMMER|DNI)[:\s]*([A-Z0-9]{6,12})\b",
            ),
            // Spanish DNI: 8 digits and a control letter
            NumberPattern::strict(r"\b\d{8}[A-Z]\b"),
            // German ID card alphabet
            NumberPattern::strict(r"\b[CFGHJKLMNPRTVWXYZ][0-9CFGHJKLMNPRTVWXYZ]{8}\b"),
        ],
        keywords: &["N°", "Nº", "NO.", "NUM", "DNI", "NUMBER", "NUMMER", "CARD NO", "DOCUMENT NO"],
    };

    static ref VISA: NumberProfile = NumberProfile {
        name: "visa",
        patterns: vec![NumberPattern::strict(
            r"(?i)(?:CONTROL\s*(?:NO\.?|NUMBER)|VISA\s*(?:NO\.?|NUMBER)|RED\s*NUMBER|N[UÚ]MERO\s+DE\s+VISADO)[:\s#]*([0-9]{8,9})\b",
        )],
        keywords: &["CONTROL", "VISA", "RED NUMBER", "VISADO"],
    };
}

impl NumberProfile {
    /// Passport-oriented patterns used by the generic resolver.
    pub fn generic() -> &'static NumberProfile {
        &GENERIC
    }

    pub fn id_card() -> &'static NumberProfile {
        &ID_CARD
    }

    pub fn visa() -> &'static NumberProfile {
        &VISA
    }
}

/// Pick the best document number in `text`.
///
/// An MRZ number, when given, is seeded with [`MRZ_SCORE`]. Every match of
/// every pattern on every line becomes a candidate; the highest score wins.
pub fn resolve_number(text: &str, mrz_number: Option<&str>, profile: &NumberProfile) -> Option<String> {
    let mut candidates = Vec::new();

    if let Some(number) = mrz_number.filter(|n| !n.is_empty()) {
        candidates.push(Candidate::new(number.to_string(), MRZ_SCORE, "MRZ"));
    }

    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        for pattern in &profile.patterns {
            let haystack = match (pattern.spans_lines, lines.get(i + 1)) {
                (true, Some(next)) => format!("{}\n{}", line, next),
                (true, None) => continue,
                (false, _) => line.to_string(),
            };

            for caps in pattern.regex.captures_iter(&haystack) {
                let Some(value) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                let score = score_candidate(&haystack, profile.keywords, pattern.kind, i, lines.len());
                trace!("Number candidate {} (score {:.2}) on line {}", value.as_str(), score, i);
                candidates.push(Candidate::new(value.as_str().to_string(), score, *line));
            }
        }
    }

    let winner = best(candidates)?;
    debug!(
        "Selected {} number {} (score {:.2}, from {:?})",
        profile.name, winner.value, winner.score, winner.source
    );
    Some(winner.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mrz_number_wins() {
        let text = "PASSPORT\nA1234567";
        assert_eq!(
            resolve_number(text, Some("X9876543"), NumberProfile::generic()),
            Some("X9876543".to_string())
        );
    }

    #[test]
    fn test_birth_context_loses() {
        // Same pattern, same position: only the denylisted context differs.
        let denied = score_candidate("DATE OF BIRTH A1234567", &[], PatternKind::Fuzzy, 0, 2);
        let clean = score_candidate("HOLDER A1234567", &[], PatternKind::Fuzzy, 0, 2);
        assert_eq!(clean - denied, 5.0);

        let generic = NumberProfile::generic();
        assert_eq!(
            resolve_number("HOLDER A1234567\nB7654321", None, generic),
            Some("A1234567".to_string())
        );
        assert_eq!(
            resolve_number("DATE OF BIRTH A1234567\nB7654321", None, generic),
            Some("B7654321".to_string())
        );
    }

    #[test]
    fn test_mrz_line_number() {
        let text = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\nL898902C36UTO7408122F1204159ZE184226B<<<<<10";
        assert_eq!(
            resolve_number(text, None, NumberProfile::generic()),
            Some("L898902C3".to_string())
        );
    }

    #[test]
    fn test_labeled_passport_number() {
        let text = "REPUBLIC OF NOWHERE\nHolder AB1234567\nPassport No: XK4455667";
        assert_eq!(
            resolve_number(text, None, NumberProfile::generic()),
            Some("XK4455667".to_string())
        );
    }

    #[test]
    fn test_id_card_dni() {
        let text = "REINO DE ESPAÑA\nDOCUMENTO NACIONAL DE IDENTIDAD\nN° 12345678Z\nVALIDEZ 01/01/2030";
        assert_eq!(
            resolve_number(text, None, NumberProfile::id_card()),
            Some("12345678Z".to_string())
        );
    }

    #[test]
    fn test_visa_control_number() {
        let text = "UNITED STATES OF AMERICA\nVISA\nControl Number 20231234567\nControl No. 202312345";
        assert_eq!(
            resolve_number(text, None, NumberProfile::visa()),
            Some("202312345".to_string())
        );
    }

    #[test]
    fn test_generic_id_label_needs_word_boundary() {
        assert_eq!(resolve_number("IDENTIDAD", None, NumberProfile::generic()), None);
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(resolve_number("", None, NumberProfile::generic()), None);
        assert_eq!(resolve_number("no numbers here", Some(""), NumberProfile::generic()), None);
    }
}
