//! Harmonic analysis records
//!
//! A [`WorkAnalysis`] is created once per parse and never mutated afterwards;
//! re-ingesting a document produces a fresh value that replaces the old one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Literal default for header fields absent from the source text
pub const UNKNOWN: &str = "Unknown";

const LOWER_NUMERALS: [&str; 7] = ["i", "ii", "iii", "iv", "v", "vi", "vii"];
const UPPER_NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Roman numeral from the fixed vocabulary `{i..vii, I..VII}`
///
/// Case distinguishes quality: upper case is major, lower case is minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RomanNumeral {
    /// Scale degree, 1..=7
    degree: u8,
    major: bool,
}

impl RomanNumeral {
    /// Exact vocabulary match; anything else (`V7`, `Ger65`, `viio`) is `None`
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(idx) = UPPER_NUMERALS.iter().position(|n| *n == token) {
            return Some(Self {
                degree: idx as u8 + 1,
                major: true,
            });
        }
        LOWER_NUMERALS
            .iter()
            .position(|n| *n == token)
            .map(|idx| Self {
                degree: idx as u8 + 1,
                major: false,
            })
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn is_major(&self) -> bool {
        self.major
    }

    pub fn as_str(&self) -> &'static str {
        let idx = (self.degree - 1) as usize;
        if self.major {
            UPPER_NUMERALS[idx]
        } else {
            LOWER_NUMERALS[idx]
        }
    }

    pub fn function(&self) -> HarmonicFunction {
        match self.degree {
            1 => HarmonicFunction::Tonic,
            2 => HarmonicFunction::Supertonic,
            3 => HarmonicFunction::Mediant,
            4 => HarmonicFunction::Subdominant,
            5 => HarmonicFunction::Dominant,
            6 => HarmonicFunction::Submediant,
            _ => HarmonicFunction::LeadingTone,
        }
    }
}

impl fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RomanNumeral {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RomanNumeral::parse(&value).ok_or_else(|| format!("not a roman numeral: {value}"))
    }
}

impl From<RomanNumeral> for String {
    fn from(value: RomanNumeral) -> Self {
        value.as_str().to_string()
    }
}

/// Functional category of a numeral (quality-independent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HarmonicFunction {
    Tonic,
    Supertonic,
    Mediant,
    Subdominant,
    Dominant,
    Submediant,
    LeadingTone,
}

impl HarmonicFunction {
    pub fn name(&self) -> &'static str {
        match self {
            HarmonicFunction::Tonic => "Tonic",
            HarmonicFunction::Supertonic => "Supertonic",
            HarmonicFunction::Mediant => "Mediant",
            HarmonicFunction::Subdominant => "Subdominant",
            HarmonicFunction::Dominant => "Dominant",
            HarmonicFunction::Submediant => "Submediant",
            HarmonicFunction::LeadingTone => "Leading tone",
        }
    }
}

impl fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Large-scale formal position label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormSection {
    Introduction,
    Exposition,
    Development,
    Recapitulation,
    Coda,
}

impl FormSection {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Introduction" => Some(FormSection::Introduction),
            "Exposition" => Some(FormSection::Exposition),
            "Development" => Some(FormSection::Development),
            "Recapitulation" => Some(FormSection::Recapitulation),
            "Coda" => Some(FormSection::Coda),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormSection::Introduction => "Introduction",
            FormSection::Exposition => "Exposition",
            FormSection::Development => "Development",
            FormSection::Recapitulation => "Recapitulation",
            FormSection::Coda => "Coda",
        }
    }
}

impl fmt::Display for FormSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measure line that carried a recognizable roman numeral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureFact {
    /// Measure number (positive)
    pub measure: u32,
    pub numeral: RomanNumeral,
    /// Key label from a `X:` token on the same line
    pub key: Option<String>,
    /// Inversion/figure marker such as `b2`
    pub inversion: Option<String>,
    /// Secondary-dominant token such as `V7/V`
    pub secondary_dominant: Option<String>,
    pub form_section: Option<FormSection>,
}

impl MeasureFact {
    pub fn new(measure: u32, numeral: RomanNumeral) -> Self {
        Self {
            measure,
            numeral,
            key: None,
            inversion: None,
            secondary_dominant: None,
            form_section: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Key if present and meaningful
    pub fn known_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty() && *k != UNKNOWN)
    }

    pub fn function(&self) -> HarmonicFunction {
        self.numeral.function()
    }
}

/// Header metadata of an annotation document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHeader {
    pub composer: String,
    pub title: String,
    pub movement: String,
    pub time_signature: String,
    pub form: String,
    pub key_signature: String,
    /// Unrecognised `Name: Value` header lines (Analyst, Proofreader, ...)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Default for WorkHeader {
    fn default() -> Self {
        Self {
            composer: UNKNOWN.to_string(),
            title: UNKNOWN.to_string(),
            movement: UNKNOWN.to_string(),
            time_signature: UNKNOWN.to_string(),
            form: UNKNOWN.to_string(),
            key_signature: UNKNOWN.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Cadence classified from the final functional pair of a work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CadenceType {
    /// Dominant → Tonic
    #[serde(rename = "Perfect/Authentic")]
    PerfectAuthentic,
    /// Subdominant → Tonic
    #[serde(rename = "Plagal")]
    Plagal,
    /// Dominant → Submediant
    #[serde(rename = "Deceptive")]
    Deceptive,
    /// Leading tone → Tonic
    #[serde(rename = "Perfect variant")]
    PerfectVariant,
}

impl CadenceType {
    pub fn label(&self) -> &'static str {
        match self {
            CadenceType::PerfectAuthentic => "Perfect/Authentic",
            CadenceType::Plagal => "Plagal",
            CadenceType::Deceptive => "Deceptive",
            CadenceType::PerfectVariant => "Perfect variant",
        }
    }
}

impl fmt::Display for CadenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Change of prevailing key at a measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modulation {
    pub measure: u32,
    pub from: String,
    pub to: String,
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}: {} → {}", self.measure, self.from, self.to)
    }
}

/// Style/difficulty bucket for downstream suggestion layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated analysis of one work, with derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkAnalysis {
    pub header: WorkHeader,
    /// Facts ordered by measure number
    pub facts: Vec<MeasureFact>,
    pub cadences: Vec<CadenceType>,
    pub modulations: Vec<Modulation>,
    pub complexity: f64,
    /// Always equal to `facts.len()`
    pub total_measures: usize,
}

impl WorkAnalysis {
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn roman_numerals(&self) -> Vec<&'static str> {
        self.facts.iter().map(|f| f.numeral.as_str()).collect()
    }

    /// Key in force at each fact: its own key, else the last key seen,
    /// else the home key signature (possibly "Unknown")
    pub fn effective_keys(&self) -> Vec<&str> {
        let mut current: &str = &self.header.key_signature;
        self.facts
            .iter()
            .map(|fact| {
                if let Some(key) = fact.known_key() {
                    current = key;
                }
                current
            })
            .collect()
    }

    /// `"key:numeral"` for every fact whose effective key is known
    pub fn chord_progression(&self) -> Vec<String> {
        self.facts
            .iter()
            .zip(self.effective_keys())
            .filter(|(_, key)| !key.is_empty() && *key != UNKNOWN)
            .map(|(fact, key)| format!("{}:{}", key, fact.numeral))
            .collect()
    }

    /// Distinct functions in first-seen order
    pub fn harmonic_functions(&self) -> Vec<HarmonicFunction> {
        let mut seen = HashSet::new();
        self.facts
            .iter()
            .map(MeasureFact::function)
            .filter(|f| seen.insert(*f))
            .collect()
    }

    pub fn form_sections(&self) -> Vec<String> {
        self.facts
            .iter()
            .filter_map(|f| f.form_section.map(|s| format!("m{}: {}", f.measure, s)))
            .collect()
    }

    pub fn cadence_labels(&self) -> Vec<String> {
        self.cadences.iter().map(|c| c.label().to_string()).collect()
    }

    pub fn modulation_labels(&self) -> Vec<String> {
        self.modulations.iter().map(|m| m.to_string()).collect()
    }

    pub fn difficulty(&self) -> Difficulty {
        crate::services::analysis_builder::classify_difficulty(
            self.chord_progression().len(),
            self.harmonic_functions().len(),
        )
    }
}
