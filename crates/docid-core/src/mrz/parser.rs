//! MRZ line detection and ICAO 9303 layout parsing.

use tracing::{debug, trace};

use crate::error::MrzError;

/// Shortest and longest cleaned line considered an MRZ line.
const MIN_LINE: usize = 28;
const MAX_LINE: usize = 46;

/// Filler characters a lone line needs to count as MRZ.
const MIN_FILLERS: usize = 5;

/// ICAO 9303 document layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrzFormat {
    /// ID cards: 3 lines of 30.
    Td1,
    /// Older ID cards and visas: 2 lines of 36.
    Td2,
    /// Passports: 2 lines of 44.
    Td3,
}

impl MrzFormat {
    fn line_length(self) -> usize {
        match self {
            MrzFormat::Td1 => 30,
            MrzFormat::Td2 => 36,
            MrzFormat::Td3 => 44,
        }
    }

    fn line_count(self) -> usize {
        match self {
            MrzFormat::Td1 => 3,
            MrzFormat::Td2 | MrzFormat::Td3 => 2,
        }
    }

    fn for_length(len: usize) -> Self {
        if len >= 40 {
            MrzFormat::Td3
        } else if len >= 33 {
            MrzFormat::Td2
        } else {
            MrzFormat::Td1
        }
    }
}

/// Fields read from an MRZ, with the share of check digits that verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzScan {
    pub format: MrzFormat,
    pub document_type: String,
    pub country: String,
    pub number: String,
    /// Expiration as printed, `YYMMDD`.
    pub expiration_raw: String,
    /// Percentage of check digits that verified, 0 to 100.
    pub valid_score: u8,
}

/// ICAO 9303 check digit: weights 7, 3, 1; `<` is 0, letters are 10..35.
pub fn check_digit(field: &str) -> u32 {
    const WEIGHTS: [u32; 3] = [7, 3, 1];
    field
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let value = match c {
                '0'..='9' => c as u32 - '0' as u32,
                'A'..='Z' => c as u32 - 'A' as u32 + 10,
                _ => 0,
            };
            value * WEIGHTS[i % 3]
        })
        .sum::<u32>()
        % 10
}

/// Replace letters OCR commonly confuses with digits.
fn correct_digits(field: &str) -> String {
    field
        .chars()
        .map(|c| match c {
            'O' | 'Q' | 'D' => '0',
            'I' | 'L' => '1',
            'Z' => '2',
            'S' => '5',
            'G' => '6',
            'B' => '8',
            other => other,
        })
        .collect()
}

fn strip_filler(field: &str) -> String {
    field.trim_matches('<').replace('<', " ").trim().to_string()
}

fn country_code(field: &str) -> String {
    let code = field.replace('<', "");
    match code.as_str() {
        "D" => "DEU".to_string(),
        _ => code,
    }
}

fn clean_line(line: &str) -> String {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '«' => '<',
            other => other.to_ascii_uppercase(),
        })
        .collect::<String>()
        .trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '<'))
        .to_string()
}

fn is_mrz_charset(line: &str) -> bool {
    (MIN_LINE..=MAX_LINE).contains(&line.len())
        && line.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '<')
}

/// Find MRZ-looking lines in OCR text.
///
/// A line qualifies when, after cleanup, it is 28 to 46 characters of
/// `[A-Z0-9<]` with at least five fillers. A line right after a qualifying
/// one only needs the charset, since line 2 of a passport can be nearly full.
pub fn find_mrz_lines(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut previous_matched = false;

    for line in text.lines().map(clean_line) {
        let charset = is_mrz_charset(&line);
        let fillers = line.chars().filter(|c| *c == '<').count();
        let matched = charset && (fillers >= MIN_FILLERS || previous_matched);
        if matched {
            trace!("MRZ line candidate: {}", line);
            found.push(line);
        }
        previous_matched = matched;
    }

    found
}

fn fit(line: &str, len: usize) -> String {
    let mut fitted: String = line.chars().take(len).collect();
    while fitted.len() < len {
        fitted.push('<');
    }
    fitted
}

struct Checks {
    passed: u32,
    total: u32,
}

impl Checks {
    fn new() -> Self {
        Self { passed: 0, total: 0 }
    }

    fn verify(&mut self, field: &str, digit: &str) {
        self.total += 1;
        let expected = check_digit(field);
        match correct_digits(digit).chars().next().and_then(|c| c.to_digit(10)) {
            Some(actual) if actual == expected => self.passed += 1,
            _ => trace!("Check digit mismatch for {:?}: expected {}", field, expected),
        }
    }

    fn score(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.passed * 100 / self.total) as u8
    }
}

/// Parse detected MRZ lines into a scan.
///
/// The layout is picked from the first line's length; lines are padded or
/// truncated to the exact layout width.
pub fn parse_lines(lines: &[String]) -> Result<MrzScan, MrzError> {
    let first = lines.first().ok_or(MrzError::NotFound)?;
    let format = MrzFormat::for_length(first.len());

    if lines.len() < format.line_count() {
        return Err(MrzError::Malformed(format!(
            "{:?} needs {} lines, found {}",
            format,
            format.line_count(),
            lines.len()
        )));
    }

    let fitted: Vec<String> = lines[..format.line_count()]
        .iter()
        .map(|l| fit(l, format.line_length()))
        .collect();

    let scan = match format {
        MrzFormat::Td1 => parse_td1(&fitted[0], &fitted[1]),
        MrzFormat::Td2 | MrzFormat::Td3 => parse_two_line(format, &fitted[0], &fitted[1]),
    };

    debug!(
        "Parsed {:?} MRZ: type={} country={} number={} score={}",
        scan.format, scan.document_type, scan.country, scan.number, scan.valid_score
    );
    Ok(scan)
}

/// TD2 and TD3 share the second-line layout up to the optional data.
fn parse_two_line(format: MrzFormat, line1: &str, line2: &str) -> MrzScan {
    let len = format.line_length();
    let number = &line2[0..9];
    let birth = correct_digits(&line2[13..19]);
    let expiry = correct_digits(&line2[21..27]);

    let mut checks = Checks::new();
    checks.verify(number, &line2[9..10]);
    checks.verify(&birth, &line2[19..20]);
    checks.verify(&expiry, &line2[27..28]);

    let composite = format!(
        "{}{}{}{}{}",
        &line2[0..10],
        birth,
        &line2[19..20],
        expiry,
        &line2[27..len - 1]
    );
    checks.verify(&composite, &line2[len - 1..]);

    MrzScan {
        format,
        document_type: strip_filler(&line1[0..2]),
        country: country_code(&line1[2..5]),
        number: number.replace('<', ""),
        expiration_raw: expiry,
        valid_score: checks.score(),
    }
}

fn parse_td1(line1: &str, line2: &str) -> MrzScan {
    let number = &line1[5..14];
    let birth = correct_digits(&line2[0..6]);
    let expiry = correct_digits(&line2[8..14]);

    let mut checks = Checks::new();
    checks.verify(number, &line1[14..15]);
    checks.verify(&birth, &line2[6..7]);
    checks.verify(&expiry, &line2[14..15]);

    let composite = format!(
        "{}{}{}{}{}{}",
        &line1[5..30],
        birth,
        &line2[6..7],
        expiry,
        &line2[14..15],
        &line2[18..29]
    );
    checks.verify(&composite, &line2[29..30]);

    MrzScan {
        format: MrzFormat::Td1,
        document_type: strip_filler(&line1[0..2]),
        country: country_code(&line1[2..5]),
        number: number.replace('<', ""),
        expiration_raw: expiry,
        valid_score: checks.score(),
    }
}

/// Detect and parse an MRZ in OCR text. `None` when no MRZ lines are present.
pub fn scan_text(text: &str) -> Result<Option<MrzScan>, MrzError> {
    let lines = find_mrz_lines(text);
    if lines.is_empty() {
        return Ok(None);
    }
    parse_lines(&lines).map(Some)
}
