//! Expiration date resolver.
//!
//! Four stages, each tried only when the previous one found nothing:
//! MRZ `YYMMDD`, a literal `DD MONTH YYYY` anywhere, a window around expiry
//! keywords, and finally a permissive scan keeping the furthest future date.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use super::text::{collapse_whitespace, fold_upper};

/// Dates further ahead than this are suspicious.
pub const FAR_FUTURE_MONTHS: u32 = 240;

/// Bare years are accepted up to this many years ahead.
const MAX_YEARS_AHEAD: i32 = 20;

/// Month names after diacritic folding: English, Spanish, German, French.
const MONTHS: &[(&str, u32)] = &[
    ("JANUARY", 1), ("JAN", 1), ("ENERO", 1), ("ENE", 1), ("JANUAR", 1), ("JANVIER", 1), ("JANV", 1),
    ("FEBRUARY", 2), ("FEB", 2), ("FEBRERO", 2), ("FEBRUAR", 2), ("FEVRIER", 2), ("FEV", 2),
    ("MARCH", 3), ("MAR", 3), ("MARZO", 3), ("MARZ", 3), ("MAERZ", 3), ("MAER", 3), ("MARS", 3),
    ("APRIL", 4), ("APR", 4), ("ABRIL", 4), ("ABR", 4), ("AVRIL", 4), ("AVR", 4),
    ("MAY", 5), ("MAYO", 5), ("MAI", 5),
    ("JUNE", 6), ("JUN", 6), ("JUNIO", 6), ("JUNI", 6), ("JUIN", 6),
    ("JULY", 7), ("JUL", 7), ("JULIO", 7), ("JULI", 7), ("JUILLET", 7), ("JUIL", 7),
    ("AUGUST", 8), ("AUG", 8), ("AGOSTO", 8), ("AGO", 8), ("AOUT", 8), ("AOU", 8),
    ("SEPTEMBER", 9), ("SEPT", 9), ("SEP", 9), ("SEPTIEMBRE", 9), ("SETIEMBRE", 9), ("SEPTEMBRE", 9),
    ("OCTOBER", 10), ("OCT", 10), ("OCTUBRE", 10), ("OKTOBER", 10), ("OKT", 10), ("OCTOBRE", 10),
    ("NOVEMBER", 11), ("NOV", 11), ("NOVIEMBRE", 11), ("NOVEMBRE", 11),
    ("DECEMBER", 12), ("DEC", 12), ("DICIEMBRE", 12), ("DIC", 12), ("DEZEMBER", 12), ("DEZ", 12),
    ("DECEMBRE", 12),
];

const EXPIRY_KEYWORDS: &[&str] = &[
    "EXP",
    "EXPIRES",
    "EXPIRY",
    "EXPIRATION",
    "VALID UNTIL",
    "VALID THRU",
    "VALIDO HASTA",
    "VALIDEZ",
    "GULTIG BIS",
    "VALABLE JUSQU",
    "VIGENCIA",
    "CADUCIDAD",
    "DATE OF EXPIRY",
];

/// One date separator, optionally padded, or plain whitespace.
const SEP: &str = r"(?:\s*[./-]\s*|\s+)";

/// Lines in a keyword window, keyword line included.
const WINDOW_LINES: usize = 4;

fn month_alternation() -> String {
    let mut names: Vec<&str> = MONTHS.iter().map(|(name, _)| *name).collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    names.join("|")
}

lazy_static! {
    static ref MONTH_TABLE: HashMap<&'static str, u32> = MONTHS.iter().copied().collect();

    static ref DAY_MONTH_YEAR: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}})[ \t]+({})\.?[ \t]+(\d{{4}})\b",
        month_alternation()
    )).unwrap();

    // Separators tolerate OCR spacing: "12 / 11 / 2028".
    static ref FULL_NUM: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{4}}|\d{{2}})\b",
        sep = SEP
    )).unwrap();

    static ref NAME_MID: Regex = Regex::new(&format!(
        r"\b(?:(\d{{1,2}})[\s./-]?)?({})\.?[\s./-]?(\d{{4}}|\d{{2}})\b",
        month_alternation()
    )).unwrap();

    static ref YEAR_ONLY: Regex = Regex::new(r"\b(20\d{2})\b").unwrap();

    // Each shape is scanned on its own so one cannot swallow another.
    static ref DATE_LIKE: Vec<Regex> = vec![
        Regex::new(r"\b\d{4}[./-]\d{1,2}[./-]\d{1,2}\b").unwrap(),
        Regex::new(r"\b\d{1,2}[ \t./-]\d{1,2}[ \t./-]\d{2,4}\b").unwrap(),
        Regex::new(r"\b\d{1,2}[ \t./-][A-Z]{3,}\.?(?:[ \t./-]\d{2,4})?\b").unwrap(),
        Regex::new(r"\b[A-Z]{3,}[ \t]+\d{4}\b").unwrap(),
    ];

    static ref LOOSE_ISO: Regex = Regex::new(r"^(\d{4})[./-](\d{1,2})[./-](\d{1,2})$").unwrap();
    static ref LOOSE_NUMERIC: Regex = Regex::new(&format!(
        r"^(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{2,4}})$",
        sep = SEP
    )).unwrap();
    static ref LOOSE_DAY_NAME: Regex =
        Regex::new(r"^(\d{1,2})[\s./-]([A-Z]{3,})\.?(?:[\s./-](\d{2,4}))?$").unwrap();
    static ref LOOSE_NAME_YEAR: Regex = Regex::new(r"^([A-Z]{3,})\s+(\d{4})$").unwrap();

    static ref MRZ_DATE: Regex = Regex::new(r"^\d{6}$").unwrap();
}

/// Which stage produced an expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirySource {
    Mrz,
    DayMonthName,
    KeywordWindow,
    Fallback,
    YearOnly,
}

/// An expiration date and the stage that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub source: ExpirySource,
}

impl ResolvedDate {
    fn new(date: NaiveDate, source: ExpirySource) -> Self {
        Self { date, source }
    }
}

/// Expand a two-digit year: below 50 is 20xx, otherwise 19xx.
pub fn expand_two_digit_year(year: u32) -> i32 {
    let year = year as i32;
    if year < 50 { 2000 + year } else { 1900 + year }
}

/// Parse an MRZ `YYMMDD` date.
pub fn parse_mrz_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !MRZ_DATE.is_match(raw) {
        return None;
    }
    let year = expand_two_digit_year(raw[0..2].parse().ok()?);
    let month = raw[2..4].parse().ok()?;
    let day = raw[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Month number for a (possibly abbreviated, possibly accented) month name.
pub fn month_from_name(name: &str) -> Option<u32> {
    MONTH_TABLE.get(fold_upper(name).trim_end_matches('.')).copied()
}

/// More than [`FAR_FUTURE_MONTHS`] after `today`.
pub fn is_far_future(date: NaiveDate, today: NaiveDate) -> bool {
    match today.checked_add_months(Months::new(FAR_FUTURE_MONTHS)) {
        Some(limit) => date > limit,
        None => false,
    }
}

fn year_from(raw: &str) -> Option<i32> {
    let value: u32 = raw.parse().ok()?;
    Some(if raw.len() <= 2 { expand_two_digit_year(value) } else { value as i32 })
}

/// `D·M·Y`, falling back to `M·D·Y` when the first reading is impossible.
fn day_month_or_month_day(first: &str, second: &str, year: &str) -> Option<NaiveDate> {
    let year = year_from(year)?;
    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    NaiveDate::from_ymd_opt(year, second, first).or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

/// Parse a loosely date-shaped substring.
///
/// Accepts `YYYY-MM-DD`, `D/M/Y` (or `M/D/Y`), `D MONTH [YEAR]` and
/// `MONTH YYYY`. A missing year means the current one; a missing day means
/// the first of the month. Bare years are not dates.
pub fn parse_loose_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = fold_upper(raw.trim());

    if let Some(caps) = LOOSE_ISO.captures(&raw) {
        return NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
    }
    if let Some(caps) = LOOSE_NUMERIC.captures(&raw) {
        return day_month_or_month_day(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = LOOSE_DAY_NAME.captures(&raw) {
        let month = month_from_name(&caps[2])?;
        let year = match caps.get(3) {
            Some(y) => year_from(y.as_str())?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, caps[1].parse().ok()?);
    }
    if let Some(caps) = LOOSE_NAME_YEAR.captures(&raw) {
        let month = month_from_name(&caps[1])?;
        return NaiveDate::from_ymd_opt(caps[2].parse().ok()?, month, 1);
    }
    None
}

fn bare_future_year(year: &str, today: NaiveDate) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    if year > today.year() && year <= today.year() + MAX_YEARS_AHEAD {
        NaiveDate::from_ymd_opt(year, 12, 31)
    } else {
        None
    }
}

/// Resolve the expiration date of a document.
///
/// `mrz_raw` is the MRZ `YYMMDD` string when one is known. Stages 1 and 4
/// accept only dates strictly after `today`; stages 2 and 3 also accept
/// `today` itself.
pub fn resolve_expiration(text: &str, mrz_raw: Option<&str>, today: NaiveDate) -> Option<ResolvedDate> {
    if let Some(date) = mrz_raw.and_then(parse_mrz_date) {
        if date > today {
            debug!("Expiration {} from MRZ", date);
            return Some(ResolvedDate::new(date, ExpirySource::Mrz));
        }
        trace!("MRZ expiration {} is not in the future", date);
    }

    let folded = fold_upper(text);

    if let Some(date) = day_month_name(&folded, today) {
        debug!("Expiration {} from day-month-year text", date);
        return Some(ResolvedDate::new(date, ExpirySource::DayMonthName));
    }

    if let Some(date) = keyword_window(&folded, today) {
        debug!("Expiration {} near expiry keyword", date);
        return Some(ResolvedDate::new(date, ExpirySource::KeywordWindow));
    }

    fallback(&folded, today)
}

fn day_month_name(folded: &str, today: NaiveDate) -> Option<NaiveDate> {
    DAY_MONTH_YEAR.captures_iter(folded).find_map(|caps| {
        let month = month_from_name(&caps[2])?;
        let date = NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[1].parse().ok()?)?;
        (date >= today).then_some(date)
    })
}

fn keyword_window(folded: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lines: Vec<&str> = folded.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if !EXPIRY_KEYWORDS.iter().any(|k| line.contains(k)) {
            continue;
        }
        let end = (i + WINDOW_LINES).min(lines.len());
        let window = collapse_whitespace(&lines[i..end].join("\n"));
        trace!("Expiry keyword window: {:?}", window);

        let numeric = FULL_NUM.captures_iter(&window).find_map(|caps| {
            day_month_or_month_day(&caps[1], &caps[2], &caps[3]).filter(|d| *d >= today)
        });
        if numeric.is_some() {
            return numeric;
        }

        let named = NAME_MID.captures_iter(&window).find_map(|caps| {
            let day = caps.get(1).map_or(Some(1), |d| d.as_str().parse().ok())?;
            let month = month_from_name(&caps[2])?;
            NaiveDate::from_ymd_opt(year_from(&caps[3])?, month, day).filter(|d| *d >= today)
        });
        if named.is_some() {
            return named;
        }

        let year = YEAR_ONLY
            .captures_iter(&window)
            .find_map(|caps| bare_future_year(&caps[1], today));
        if year.is_some() {
            return year;
        }
    }

    None
}

fn fallback(folded: &str, today: NaiveDate) -> Option<ResolvedDate> {
    // Furthest future date, not the nearest.
    let furthest = DATE_LIKE
        .iter()
        .flat_map(|regex| regex.find_iter(folded))
        .filter_map(|m| parse_loose_date(m.as_str(), today))
        .filter(|d| *d > today)
        .max();
    if let Some(date) = furthest {
        debug!("Expiration {} from permissive scan", date);
        return Some(ResolvedDate::new(date, ExpirySource::Fallback));
    }

    let year = YEAR_ONLY
        .captures_iter(folded)
        .filter_map(|caps| bare_future_year(&caps[1], today))
        .max()?;
    debug!("Expiration {} synthesized from bare year", year);
    Some(ResolvedDate::new(year, ExpirySource::YearOnly))
}
