//! Corpus export
//!
//! Two renderings of a [`CorpusIndex`], both derived from the in-memory index
//! without re-reading any annotation document:
//! - structured JSON: descriptor, header metadata and derived statistics per item
//! - flat CSV: one row per item with identity, paths and header fields
//!
//! Export failures surface as [`CorpusError::ExportTarget`] to the caller and
//! leave the index untouched.

use crate::error::{CorpusError, CorpusResult};
use crate::models::{Difficulty, WorkDescriptor, WorkIdentity};
use crate::services::corpus_index::{CorpusEntry, CorpusIndex, CorpusStatistics};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unsupported export format: {other}")),
        }
    }
}

/// Header fields carried per structured item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub title: String,
    pub time_signature: String,
    pub form: String,
    pub key_signature: String,
    pub total_measures: usize,
    pub movement: String,
}

/// Derived features carried per structured item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatistics {
    pub measure_count: usize,
    pub cadences: Vec<String>,
    pub modulations: Vec<String>,
    pub complexity: f64,
    pub harmonic_functions: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportItem {
    pub descriptor: WorkDescriptor,
    pub metadata: ItemMetadata,
    pub statistics: ItemStatistics,
}

impl From<&CorpusEntry> for ExportItem {
    fn from(entry: &CorpusEntry) -> Self {
        let analysis = &entry.analysis;
        let header = &analysis.header;

        ExportItem {
            descriptor: entry.descriptor.clone(),
            metadata: ItemMetadata {
                title: header.title.clone(),
                time_signature: header.time_signature.clone(),
                form: header.form.clone(),
                key_signature: header.key_signature.clone(),
                total_measures: analysis.total_measures,
                movement: header.movement.clone(),
            },
            statistics: ItemStatistics {
                measure_count: analysis.len(),
                cadences: analysis.cadence_labels(),
                modulations: analysis.modulation_labels(),
                complexity: analysis.complexity,
                harmonic_functions: analysis
                    .harmonic_functions()
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect(),
                difficulty: analysis.difficulty(),
            },
        }
    }
}

/// Whole-corpus structured document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredExport {
    pub generated_at: DateTime<Utc>,
    pub total_items: usize,
    pub items: Vec<ExportItem>,
    pub statistics: CorpusStatistics,
}

/// One flat export row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub family: String,
    pub composer: String,
    pub work: String,
    pub movement: String,
    pub analysis_path: String,
    /// Empty cell when the work has no score
    pub score_path: Option<String>,
    pub title: String,
    pub time_signature: String,
    pub form: String,
    pub key_signature: String,
    pub total_measures: usize,
}

impl FlatRecord {
    pub fn identity(&self) -> WorkIdentity {
        WorkIdentity {
            family: self.family.clone(),
            composer: self.composer.clone(),
            work: self.work.clone(),
            movement: self.movement.clone(),
        }
    }
}

impl From<&CorpusEntry> for FlatRecord {
    fn from(entry: &CorpusEntry) -> Self {
        let d = &entry.descriptor;
        let h = &entry.analysis.header;

        FlatRecord {
            family: d.family.clone(),
            composer: d.composer.clone(),
            work: d.work.clone(),
            movement: d.movement.clone(),
            analysis_path: d.analysis_path.to_string_lossy().to_string(),
            score_path: d
                .score_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            title: h.title.clone(),
            time_signature: h.time_signature.clone(),
            form: h.form.clone(),
            key_signature: h.key_signature.clone(),
            total_measures: entry.analysis.total_measures,
        }
    }
}

pub fn structured_export(index: &CorpusIndex) -> StructuredExport {
    StructuredExport {
        generated_at: Utc::now(),
        total_items: index.len(),
        items: index.iter().map(ExportItem::from).collect(),
        statistics: index.statistics(),
    }
}

pub fn flat_records(index: &CorpusIndex) -> Vec<FlatRecord> {
    index.iter().map(FlatRecord::from).collect()
}

/// Write the structured JSON export to `path`
pub fn write_structured(index: &CorpusIndex, path: &Path) -> CorpusResult<()> {
    let document = structured_export(index);
    let file = File::create(path).map_err(|e| CorpusError::export_target(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, &document)
        .map_err(|e| CorpusError::export_target(path, e))?;
    writer
        .flush()
        .map_err(|e| CorpusError::export_target(path, e))?;

    info!(path = %path.display(), items = document.total_items, "Structured export written");
    Ok(())
}

/// Write the flat CSV export to `path`
pub fn write_flat(index: &CorpusIndex, path: &Path) -> CorpusResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| CorpusError::export_target(path, e))?;

    let records = flat_records(index);
    for record in &records {
        writer
            .serialize(record)
            .map_err(|e| CorpusError::export_target(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| CorpusError::export_target(path, e))?;

    info!(path = %path.display(), rows = records.len(), "Flat export written");
    Ok(())
}

pub fn read_structured(path: &Path) -> CorpusResult<StructuredExport> {
    let file = File::open(path).map_err(|e| CorpusError::export_target(path, e))?;
    let document = serde_json::from_reader(BufReader::new(file))?;
    Ok(document)
}

pub fn read_flat(path: &Path) -> CorpusResult<Vec<FlatRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CorpusError::export_target(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<FlatRecord>, csv::Error>>()
        .map_err(|e| CorpusError::export_target(path, e))
}

/// Write `corpus_export_<YYYYmmdd_HHMMSS>.<ext>` into `dir`, creating it if needed
pub fn export_to_dir(index: &CorpusIndex, dir: &Path, format: ExportFormat) -> CorpusResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| CorpusError::export_target(dir, e))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("corpus_export_{}.{}", stamp, format.extension()));

    match format {
        ExportFormat::Json => write_structured(index, &path)?,
        ExportFormat::Csv => write_flat(index, &path)?,
    }

    Ok(path)
}
