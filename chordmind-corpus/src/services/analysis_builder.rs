//! Work analysis assembly and derived features
//!
//! Turns a [`ParsedDocument`] into an immutable [`WorkAnalysis`] carrying the
//! cadence list, modulation list and complexity score. Also hosts the pure
//! difficulty and period classifiers used by suggestion layers.

use crate::error::CorpusResult;
use crate::models::{
    CadenceType, Difficulty, HarmonicFunction, MeasureFact, Modulation, WorkAnalysis,
    WorkDescriptor,
};
use crate::services::annotation_parser::{self, ParsedDocument};
use crate::services::corpus_scanner::locate_annotation_for_score;
use chordmind_common::{ComplexityConfig, CorpusConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Substrings marking extended harmony (sevenths, diminished, augmented,
/// suspensions, accidentals)
const EXTENDED_MARKERS: [&str; 8] = ["7", "dim", "aug", "sus", "b", "#", "o", "+"];

/// Complexity score weights
///
/// Negative weights are raised to zero so the score stays monotonic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityWeights {
    pub per_measure: f64,
    pub per_key: f64,
    pub per_function: f64,
    pub per_extended: f64,
    pub ceiling: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self::from(&ComplexityConfig::default())
    }
}

impl From<&ComplexityConfig> for ComplexityWeights {
    fn from(config: &ComplexityConfig) -> Self {
        Self {
            per_measure: config.per_measure.max(0.0),
            per_key: config.per_key.max(0.0),
            per_function: config.per_function.max(0.0),
            per_extended: config.per_extended.max(0.0),
            ceiling: config.ceiling.max(0.0),
        }
    }
}

/// Builds [`WorkAnalysis`] values from parser output
#[derive(Debug, Clone, Default)]
pub struct WorkAnalysisBuilder {
    weights: ComplexityWeights,
}

impl WorkAnalysisBuilder {
    pub fn new(weights: ComplexityWeights) -> Self {
        Self { weights }
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(ComplexityWeights::from(&config.complexity))
    }

    pub fn weights(&self) -> &ComplexityWeights {
        &self.weights
    }

    /// Build the analysis of one scanned work
    pub fn build(&self, descriptor: &WorkDescriptor, parsed: ParsedDocument) -> WorkAnalysis {
        let highest_measure = parsed.highest_measure;
        let skipped_lines = parsed.skipped_lines;
        let analysis = self.assemble(parsed);

        debug!(
            work = %descriptor.identity(),
            facts = analysis.total_measures,
            highest_measure,
            skipped_lines,
            cadences = analysis.cadences.len(),
            modulations = analysis.modulations.len(),
            complexity = analysis.complexity,
            "Work analysis built"
        );

        analysis
    }

    /// Build an analysis from parser output alone
    pub fn assemble(&self, parsed: ParsedDocument) -> WorkAnalysis {
        let ParsedDocument { header, facts, .. } = parsed;

        let cadences = detect_cadences(&facts);
        let modulations = detect_modulations(&facts);
        let complexity = complexity_score(&facts, &self.weights);
        let total_measures = facts.len();

        WorkAnalysis {
            header,
            facts,
            cadences,
            modulations,
            complexity,
            total_measures,
        }
    }
}

/// Classify the final adjacent pair of facts
pub fn detect_cadences(facts: &[MeasureFact]) -> Vec<CadenceType> {
    let [.., penultimate, last] = facts else {
        return Vec::new();
    };

    let cadence = match (penultimate.function(), last.function()) {
        (HarmonicFunction::Dominant, HarmonicFunction::Tonic) => Some(CadenceType::PerfectAuthentic),
        (HarmonicFunction::Subdominant, HarmonicFunction::Tonic) => Some(CadenceType::Plagal),
        (HarmonicFunction::Dominant, HarmonicFunction::Submediant) => Some(CadenceType::Deceptive),
        (HarmonicFunction::LeadingTone, HarmonicFunction::Tonic) => {
            Some(CadenceType::PerfectVariant)
        }
        _ => None,
    };

    cadence.into_iter().collect()
}

/// Key changes between consecutive known key labels
pub fn detect_modulations(facts: &[MeasureFact]) -> Vec<Modulation> {
    let mut modulations = Vec::new();
    let mut previous: Option<&str> = None;

    for fact in facts {
        let Some(key) = fact.known_key() else {
            continue;
        };

        if let Some(prev) = previous {
            if prev != key {
                modulations.push(Modulation {
                    measure: fact.measure,
                    from: prev.to_string(),
                    to: key.to_string(),
                });
            }
        }
        previous = Some(key);
    }

    modulations
}

/// Weighted, clamped complexity accumulator
pub fn complexity_score(facts: &[MeasureFact], weights: &ComplexityWeights) -> f64 {
    let distinct_keys: HashSet<&str> = facts.iter().filter_map(MeasureFact::known_key).collect();
    let distinct_functions: HashSet<HarmonicFunction> =
        facts.iter().map(MeasureFact::function).collect();
    let extended = facts.iter().filter(|f| has_extended_marker(f)).count();

    let score = weights.per_measure * facts.len() as f64
        + weights.per_key * distinct_keys.len() as f64
        + weights.per_function * distinct_functions.len() as f64
        + weights.per_extended * extended as f64;

    score.max(0.0).min(weights.ceiling)
}

/// Numeral, figure or secondary-dominant token carries an extended marker
pub fn has_extended_marker(fact: &MeasureFact) -> bool {
    let figure = fact
        .inversion
        .as_deref()
        .map(|inv| inv.strip_prefix('b').unwrap_or(inv));

    [
        Some(fact.numeral.as_str()),
        figure,
        fact.secondary_dominant.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|token| EXTENDED_MARKERS.iter().any(|m| token.contains(m)))
}

/// Difficulty from progression length and distinct-function count
pub fn classify_difficulty(progression_len: usize, distinct_functions: usize) -> Difficulty {
    if progression_len <= 4 && distinct_functions <= 2 {
        Difficulty::Beginner
    } else if progression_len <= 8 && distinct_functions <= 4 {
        Difficulty::Intermediate
    } else {
        Difficulty::Advanced
    }
}

/// Stylistic period inferred from composer and family names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePeriod {
    Baroque,
    Classical,
    Romantic,
    Jazz,
    Pop,
}

impl StylePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StylePeriod::Baroque => "baroque",
            StylePeriod::Classical => "classical",
            StylePeriod::Romantic => "romantic",
            StylePeriod::Jazz => "jazz",
            StylePeriod::Pop => "pop",
        }
    }
}

impl fmt::Display for StylePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_period(composer: &str, family: &str) -> StylePeriod {
    let composer = composer.to_lowercase();
    let family = family.to_lowercase();
    let composer_is = |names: &[&str]| names.iter().any(|n| composer.contains(n));

    if composer_is(&["bach", "handel", "vivaldi"]) {
        StylePeriod::Baroque
    } else if composer_is(&["mozart", "haydn", "beethoven"]) {
        StylePeriod::Classical
    } else if composer_is(&["chopin", "schubert", "schumann"]) {
        StylePeriod::Romantic
    } else if family.contains("jazz") {
        StylePeriod::Jazz
    } else if family.contains("pop") || family.contains("rock") {
        StylePeriod::Pop
    } else {
        StylePeriod::Classical
    }
}

/// Analyze the annotation document belonging to a score file
///
/// Returns `Ok(None)` when no annotation document sits next to the score.
pub fn analyze_score(score_path: &Path, config: &CorpusConfig) -> CorpusResult<Option<WorkAnalysis>> {
    let Some(analysis_path) = locate_annotation_for_score(score_path, &config.annotation_filename)
    else {
        debug!(score = %score_path.display(), "No annotation document for score");
        return Ok(None);
    };

    let parsed = annotation_parser::parse_file(&analysis_path)?;
    Ok(Some(WorkAnalysisBuilder::from_config(config).assemble(parsed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RomanNumeral;
    use crate::services::annotation_parser::parse_document;

    fn fact(measure: u32, numeral: &str) -> MeasureFact {
        MeasureFact::new(measure, RomanNumeral::parse(numeral).unwrap())
    }

    fn keyed(measure: u32, numeral: &str, key: &str) -> MeasureFact {
        fact(measure, numeral).with_key(key)
    }

    #[test]
    fn test_worked_example_features() {
        let parsed = parse_document(
            "Composer: TestComposer\nTitle: TestWork\nKey: C\nm1 C: I\nm2 G: V\nm3 C: I\n",
        );
        let analysis = WorkAnalysisBuilder::default().assemble(parsed);

        assert_eq!(analysis.total_measures, 3);
        assert_eq!(analysis.len(), analysis.total_measures);
        assert_eq!(analysis.modulation_labels(), vec!["m2: C → G", "m3: G → C"]);
        assert_eq!(analysis.cadence_labels(), vec!["Perfect/Authentic"]);
    }

    #[test]
    fn test_cadence_table() {
        let cases = [
            ("IV", "I", Some(CadenceType::Plagal)),
            ("V", "vi", Some(CadenceType::Deceptive)),
            ("vii", "i", Some(CadenceType::PerfectVariant)),
            ("v", "i", Some(CadenceType::PerfectAuthentic)),
            ("I", "V", None),
            ("ii", "I", None),
        ];

        for (a, b, expected) in cases {
            let facts = vec![fact(1, "I"), fact(2, a), fact(3, b)];
            assert_eq!(
                detect_cadences(&facts),
                expected.into_iter().collect::<Vec<_>>(),
                "{a} -> {b}"
            );
        }
    }

    #[test]
    fn test_cadence_only_considers_final_pair() {
        let facts = vec![fact(1, "V"), fact(2, "I"), fact(3, "ii")];
        assert!(detect_cadences(&facts).is_empty());
    }

    #[test]
    fn test_fewer_than_two_facts_has_no_cadence() {
        assert!(detect_cadences(&[]).is_empty());
        assert!(detect_cadences(&[fact(1, "I")]).is_empty());
    }

    #[test]
    fn test_constant_key_has_no_modulations() {
        let facts = vec![keyed(1, "I", "D"), keyed(2, "V", "D"), fact(3, "I"), keyed(4, "I", "D")];
        assert!(detect_modulations(&facts).is_empty());
    }

    #[test]
    fn test_modulation_skips_unknown_keys() {
        let facts = vec![
            keyed(1, "I", "C"),
            keyed(2, "V", "Unknown"),
            fact(3, "I"),
            keyed(4, "I", "C"),
            keyed(5, "I", "a"),
            keyed(6, "V", "a"),
        ];
        let labels: Vec<String> = detect_modulations(&facts).iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["m5: C → a"]);
    }

    #[test]
    fn test_complexity_is_monotonic() {
        let weights = ComplexityWeights::default();
        let base = vec![keyed(1, "I", "C"), fact(2, "V")];
        let base_score = complexity_score(&base, &weights);

        let mut more_measures = base.clone();
        more_measures.push(fact(3, "V"));
        assert!(complexity_score(&more_measures, &weights) >= base_score);

        let mut new_key = base.clone();
        new_key[1] = keyed(2, "V", "G");
        assert!(complexity_score(&new_key, &weights) >= base_score);

        let mut new_function = base.clone();
        new_function[1] = fact(2, "IV");
        new_function.push(fact(3, "ii"));
        let mut same_function = base.clone();
        same_function[1] = fact(2, "IV");
        same_function.push(fact(3, "IV"));
        assert!(
            complexity_score(&new_function, &weights) >= complexity_score(&same_function, &weights)
        );

        let mut extended = base.clone();
        extended[1].secondary_dominant = Some("V7/V".into());
        assert!(complexity_score(&extended, &weights) > base_score);
    }

    #[test]
    fn test_complexity_is_clamped() {
        let weights = ComplexityWeights::default();
        let facts: Vec<MeasureFact> = (1..=2000).map(|m| fact(m, "I")).collect();
        assert_eq!(complexity_score(&facts, &weights), weights.ceiling);
        assert_eq!(complexity_score(&[], &weights), 0.0);
    }

    #[test]
    fn test_negative_weights_raised_to_zero() {
        let config = ComplexityConfig {
            per_measure: -1.0,
            ..ComplexityConfig::default()
        };
        assert_eq!(ComplexityWeights::from(&config).per_measure, 0.0);
    }

    #[test]
    fn test_extended_marker_sources() {
        let mut f = fact(1, "V");
        assert!(!has_extended_marker(&f));
        f.inversion = Some("b7".into());
        assert!(has_extended_marker(&f));
        f.inversion = Some("b2".into());
        assert!(!has_extended_marker(&f));
        f.secondary_dominant = Some("Vsus".into());
        assert!(has_extended_marker(&f));
    }

    #[test]
    fn test_difficulty_classification() {
        assert_eq!(classify_difficulty(4, 2), Difficulty::Beginner);
        assert_eq!(classify_difficulty(8, 4), Difficulty::Intermediate);
        assert_eq!(classify_difficulty(12, 6), Difficulty::Advanced);
        assert_eq!(classify_difficulty(3, 3), Difficulty::Intermediate);
    }

    #[test]
    fn test_period_classification() {
        assert_eq!(classify_period("Bach, Johann Sebastian", "Chorales"), StylePeriod::Baroque);
        assert_eq!(classify_period("Beethoven", "Piano_Sonatas"), StylePeriod::Classical);
        assert_eq!(classify_period("Schubert", "OpenScore-LiederCorpus"), StylePeriod::Romantic);
        assert_eq!(classify_period("Monk", "Jazz_Standards"), StylePeriod::Jazz);
        assert_eq!(classify_period("Anon", "Pop_Songs"), StylePeriod::Pop);
        assert_eq!(classify_period("Anon", "Etudes"), StylePeriod::Classical);
    }
}
