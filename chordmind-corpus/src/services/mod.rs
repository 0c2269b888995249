//! Corpus engine services
//!
//! Data flows one way: scanner → parser → builder → index → exporter.
//! `training` renders the index for the model-training collaborator.

pub mod analysis_builder;
pub mod annotation_parser;
pub mod corpus_index;
pub mod corpus_scanner;
pub mod exporter;
pub mod training;

pub use analysis_builder::{
    analyze_score, classify_difficulty, classify_period, ComplexityWeights, StylePeriod,
    WorkAnalysisBuilder,
};
pub use annotation_parser::{parse_document, parse_file, ParsedDocument};
pub use corpus_index::{
    page, CorpusEntry, CorpusIndex, CorpusStatistics, Page, QualityReport, SearchResult,
};
pub use corpus_scanner::{locate_annotation_for_score, CorpusScanner, ScanSummary};
pub use exporter::{
    export_to_dir, read_flat, read_structured, write_flat, write_structured, ExportFormat,
    ExportItem, FlatRecord, StructuredExport,
};
pub use training::{
    hand_off, training_samples, training_text, write_training_jsonl, HandOff, Trainer,
    TrainingSample,
};
