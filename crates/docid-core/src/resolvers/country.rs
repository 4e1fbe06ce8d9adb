//! Issuing country resolver.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use super::countries::is_valid_country_code;
use super::{Candidate, MRZ_SCORE, PatternKind, score_candidate};

/// Where a country candidate came from, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CountrySource {
    Mrz,
    MrzLine,
    Header,
    Context,
    Generic,
}

const MRZ_LINE_SCORE: f32 = 9.0;
const HEADER_SCORE: f32 = 8.0;

lazy_static! {
    static ref MRZ_LINE: Vec<Regex> = vec![
        Regex::new(r"P<([A-Z]{3})").unwrap(),
        Regex::new(r"([A-Z]{3})<").unwrap(),
        Regex::new(r"([A-Z]{3})\d{9}").unwrap(),
    ];

    static ref HEADER: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(?:PASSPORT|ID\s+CARD|DOCUMENT)\s+OF\s+(?-i:([A-Z]{3}))\b").unwrap(),
        Regex::new(r"(?i)\b(?-i:([A-Z]{3}))\s+(?:PASSPORT|ID\s+CARD|DOCUMENT)\b").unwrap(),
        Regex::new(r"(?i)\bISSUED\s+BY\s+(?-i:([A-Z]{3}))\b").unwrap(),
    ];

    static ref CONTEXT: Regex = Regex::new(
        r"(?i)\b(?:ISSUING\s+COUNTRY|COUNTRY\s+OF\s+ISSUE|NATIONALITY|ISSUING\s+AUTHORITY|ISSUED\s+BY|AUTHORITY|COUNTRY|STATE)\b[\s:/]*(?-i:([A-Z]{3}))\b"
    ).unwrap();

    static ref TOKEN: Regex = Regex::new(r"\b([A-Z]{3})\b").unwrap();
}

struct Scored {
    candidate: Candidate<String>,
    tier: CountrySource,
    order: usize,
}

#[derive(Default)]
struct Collector {
    scored: Vec<Scored>,
}

impl Collector {
    /// Add a candidate if it is a real, non-denylisted alpha-3 code.
    fn push(&mut self, code: &str, score: f32, tier: CountrySource, source: &str) -> bool {
        if !is_valid_country_code(code) {
            trace!("Discarding country candidate {:?} ({:?})", code, tier);
            return false;
        }
        trace!("Country candidate {} (score {:.2}, {:?})", code, score, tier);
        let order = self.scored.len();
        self.scored.push(Scored {
            candidate: Candidate::new(code.to_string(), score, source),
            tier,
            order,
        });
        true
    }

    fn winner(mut self) -> Option<Scored> {
        self.scored.sort_by(|a, b| {
            b.candidate
                .score
                .total_cmp(&a.candidate.score)
                .then(a.tier.cmp(&b.tier))
                .then(a.order.cmp(&b.order))
        });
        self.scored.into_iter().next()
    }
}

/// Pick the issuing country code for `text`.
///
/// Candidates come from five tiers (MRZ data, MRZ lines, document headers,
/// labeled context, bare three-letter tokens). Highest score wins; equal
/// scores fall back to tier priority, then to order of discovery.
pub fn resolve_country(text: &str, mrz_country: Option<&str>) -> Option<String> {
    let mut collector = Collector::default();

    if let Some(code) = mrz_country.filter(|c| !c.is_empty()) {
        collector.push(code, MRZ_SCORE, CountrySource::Mrz, "MRZ");
    }

    let lines: Vec<&str> = text.lines().collect();
    let total = lines.len();

    for line in &lines {
        for regex in MRZ_LINE.iter() {
            let found = regex
                .captures_iter(line)
                .any(|caps| collector.push(&caps[1], MRZ_LINE_SCORE, CountrySource::MrzLine, line));
            if found {
                break;
            }
        }
    }

    for line in &lines {
        for regex in HEADER.iter() {
            for caps in regex.captures_iter(line) {
                collector.push(&caps[1], HEADER_SCORE, CountrySource::Header, line);
            }
        }
    }

    for (i, line) in lines.iter().enumerate() {
        // The label is part of the match, so no separate keyword bonus.
        for caps in CONTEXT.captures_iter(line) {
            let score = score_candidate(line, &[], PatternKind::Strict, i, total);
            collector.push(&caps[1], score, CountrySource::Context, line);
        }
    }

    for (i, line) in lines.iter().enumerate() {
        for caps in TOKEN.captures_iter(line) {
            let score = score_candidate(line, &[], PatternKind::Fuzzy, i, total);
            collector.push(&caps[1], score, CountrySource::Generic, line);
        }
    }

    let winner = collector.winner()?;
    debug!(
        "Selected country {} (score {:.2}, {:?})",
        winner.candidate.value, winner.candidate.score, winner.tier
    );
    Some(winner.candidate.value)
}
