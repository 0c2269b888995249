//! Flattened training text for the harmony model trainer
//!
//! Each analysed work renders as one line:
//! ```text
//! <START> Composer: c | Title: t | Movement: m | Time signature: ts | Form: f | Key: k | m1 C:I | m2 G:V <END>
//! ```
//! The trainer is an optional collaborator. Samples are produced whether or
//! not one is available.

use crate::error::{CorpusError, CorpusResult};
use crate::models::{WorkAnalysis, WorkIdentity};
use crate::services::corpus_index::CorpusIndex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

const START_TOKEN: &str = "<START>";
const END_TOKEN: &str = "<END>";
const SEPARATOR: &str = " | ";

/// One training line plus the figures a trainer uses for weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub identity: WorkIdentity,
    pub text: String,
    pub complexity: f64,
    pub total_measures: usize,
}

/// Model-training collaborator
pub trait Trainer {
    fn name(&self) -> &str;

    /// Whether the training backend can accept samples right now
    fn is_available(&self) -> bool;

    fn submit(&self, samples: &[TrainingSample]) -> CorpusResult<()>;
}

/// Outcome of [`hand_off`]
#[derive(Debug, Clone)]
pub struct HandOff {
    pub samples: Vec<TrainingSample>,
    pub submitted: bool,
}

/// Render one analysis as a training line
pub fn training_text(analysis: &WorkAnalysis) -> String {
    let h = &analysis.header;
    let mut parts = vec![
        format!("Composer: {}", h.composer),
        format!("Title: {}", h.title),
        format!("Movement: {}", h.movement),
        format!("Time signature: {}", h.time_signature),
        format!("Form: {}", h.form),
        format!("Key: {}", h.key_signature),
    ];

    parts.extend(
        analysis
            .facts
            .iter()
            .zip(analysis.effective_keys())
            .map(|(fact, key)| format!("m{} {}:{}", fact.measure, key, fact.numeral)),
    );

    format!("{} {} {}", START_TOKEN, parts.join(SEPARATOR), END_TOKEN)
}

/// Samples for every entry with at least one fact, in index order
pub fn training_samples(index: &CorpusIndex) -> Vec<TrainingSample> {
    index
        .iter()
        .filter(|e| e.has_usable_analysis())
        .map(|e| TrainingSample {
            identity: e.identity(),
            text: training_text(&e.analysis),
            complexity: e.analysis.complexity,
            total_measures: e.analysis.total_measures,
        })
        .collect()
}

/// Write samples as JSON lines; returns the number written
pub fn write_training_jsonl(index: &CorpusIndex, path: &Path) -> CorpusResult<usize> {
    let samples = training_samples(index);
    let file = File::create(path).map_err(|e| CorpusError::export_target(path, e))?;
    let mut writer = BufWriter::new(file);

    for sample in &samples {
        serde_json::to_writer(&mut writer, sample).map_err(|e| CorpusError::export_target(path, e))?;
        writer
            .write_all(b"\n")
            .map_err(|e| CorpusError::export_target(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| CorpusError::export_target(path, e))?;

    info!(path = %path.display(), samples = samples.len(), "Training text written");
    Ok(samples.len())
}

/// Emit samples and pass them to the trainer when one is available
pub fn hand_off(index: &CorpusIndex, trainer: Option<&dyn Trainer>) -> CorpusResult<HandOff> {
    let samples = training_samples(index);

    let submitted = match trainer {
        Some(trainer) if trainer.is_available() => {
            trainer.submit(&samples)?;
            info!(trainer = trainer.name(), samples = samples.len(), "Samples submitted to trainer");
            true
        }
        Some(trainer) => {
            warn!(trainer = trainer.name(), "Trainer unavailable, samples not submitted");
            false
        }
        None => false,
    };

    Ok(HandOff { samples, submitted })
}
