//! Roman-numeral annotation parser
//!
//! Parses the text of one annotation document into header metadata and an
//! ordered list of [`MeasureFact`]s.
//!
//! Document shape:
//! ```text
//! Composer: Beethoven
//! Title: Piano Sonata No. 8
//! Key: c
//! m1 c: i
//! m2 b3 V
//! m5 Exposition E-: I
//! ```
//!
//! Tokens on a measure line are classified independently, first matching
//! rule wins:
//! 1. ends with `:` and the prefix is 1..=3 chars → key label (last wins)
//! 2. exact roman numeral `i..vii` / `I..VII` → numeral
//! 3. `b` followed by digits → inversion/figure marker
//! 4. starts with `V` and is not a bare numeral → secondary dominant
//! 5. form-section name → form-section label
//!
//! Nothing in a document aborts the parse. Bad lines are skipped and logged
//! at debug level.

use crate::error::{CorpusError, CorpusResult};
use crate::models::{FormSection, MeasureFact, RomanNumeral, WorkHeader};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Longest prefix accepted as a key label (`c#:`, `Eb:`, `F#m:` ...)
const MAX_KEY_LABEL_CHARS: usize = 3;

/// Parser output for one document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    pub header: WorkHeader,
    /// Facts ordered by measure number, one per measure
    pub facts: Vec<MeasureFact>,
    /// Largest measure number on any well-formed measure line
    pub highest_measure: u32,
    /// Measure lines that produced no fact
    pub skipped_lines: usize,
}

/// Read and parse an annotation document from disk
pub fn parse_file(path: &Path) -> CorpusResult<ParsedDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| CorpusError::unreadable(path, e))?;
    Ok(parse_document(&text))
}

/// Parse annotation text
pub fn parse_document(text: &str) -> ParsedDocument {
    let mut header = WorkHeader::default();
    let mut facts: BTreeMap<u32, MeasureFact> = BTreeMap::new();
    let mut highest_measure = 0u32;
    let mut skipped_lines = 0usize;
    let mut in_body = false;

    // Editors on some platforms prepend a byte-order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if is_measure_line(line) {
            in_body = true;
            match parse_measure_line(line, line_number) {
                Ok((measure, Some(fact))) => {
                    highest_measure = highest_measure.max(measure);
                    if facts.insert(measure, fact).is_some() {
                        debug!(line_number, measure, "Repeated measure replaces earlier fact");
                    }
                }
                Ok((measure, None)) => {
                    highest_measure = highest_measure.max(measure);
                    skipped_lines += 1;
                    debug!(line_number, measure, "Measure line without roman numeral");
                }
                Err(e) => {
                    skipped_lines += 1;
                    debug!(error = %e, "Skipping measure line");
                }
            }
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if in_body {
            debug!(line_number, field = name.trim(), "Ignoring header line after first measure");
            continue;
        }

        if let Err(e) = apply_header_line(&mut header, name.trim(), value.trim()) {
            debug!(error = %e, line_number, "Header field left as Unknown");
        }
    }

    ParsedDocument {
        header,
        facts: facts.into_values().collect(),
        highest_measure,
        skipped_lines,
    }
}

/// `m` immediately followed by a digit
fn is_measure_line(line: &str) -> bool {
    let mut chars = line.chars();
    chars.next() == Some('m') && chars.next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}

fn apply_header_line(header: &mut WorkHeader, name: &str, value: &str) -> CorpusResult<()> {
    let slot = match name.to_lowercase().as_str() {
        "composer" => &mut header.composer,
        "title" => &mut header.title,
        "movement" => &mut header.movement,
        "time signature" => &mut header.time_signature,
        "form" => &mut header.form,
        "key" => &mut header.key_signature,
        _ => {
            if !name.is_empty() && !value.is_empty() {
                header.extra.insert(name.to_string(), value.to_string());
            }
            return Ok(());
        }
    };

    if value.is_empty() {
        return Err(CorpusError::MalformedHeader {
            field: name.to_string(),
            reason: "empty value".to_string(),
        });
    }

    *slot = value.to_string();
    Ok(())
}

/// Parse one measure line into its measure number and optional fact
fn parse_measure_line(
    line: &str,
    line_number: usize,
) -> CorpusResult<(u32, Option<MeasureFact>)> {
    let mut tokens = line.split_whitespace();
    let measure_token = tokens.next().unwrap_or_default();
    let measure = parse_measure_number(measure_token).map_err(|reason| {
        CorpusError::MalformedLine {
            line_number,
            reason,
        }
    })?;

    let mut numeral: Option<RomanNumeral> = None;
    let mut key: Option<String> = None;
    let mut inversion: Option<String> = None;
    let mut secondary_dominant: Option<String> = None;
    let mut form_section: Option<FormSection> = None;

    for token in tokens {
        if let Some(label) = key_label(token) {
            key = Some(label.to_string());
        } else if let Some(parsed) = RomanNumeral::parse(token) {
            numeral = Some(parsed);
        } else if is_inversion(token) {
            inversion = Some(token.to_string());
        } else if token.starts_with('V') && token.len() > 1 {
            secondary_dominant = Some(token.to_string());
        } else if let Some(section) = FormSection::parse(token) {
            form_section = Some(section);
        }
    }

    let fact = numeral.map(|numeral| MeasureFact {
        measure,
        numeral,
        key,
        inversion,
        secondary_dominant,
        form_section,
    });

    Ok((measure, fact))
}

fn parse_measure_number(token: &str) -> Result<u32, String> {
    let digits = token
        .strip_prefix('m')
        .ok_or_else(|| format!("measure token {token:?} lacks 'm' prefix"))?;

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("measure token {token:?} is not m<integer>"));
    }

    let measure: u32 = digits
        .parse()
        .map_err(|e| format!("measure token {token:?}: {e}"))?;

    if measure == 0 {
        return Err("measure numbers start at 1".to_string());
    }

    Ok(measure)
}

fn key_label(token: &str) -> Option<&str> {
    let prefix = token.strip_suffix(':')?;
    let len = prefix.chars().count();
    (len > 0 && len <= MAX_KEY_LABEL_CHARS).then_some(prefix)
}

fn is_inversion(token: &str) -> bool {
    token
        .strip_prefix('b')
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
}
