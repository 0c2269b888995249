//! chordmind-corpus library interface
//!
//! Corpus ingestion and harmonic-analysis engine for roman-numeral annotated
//! score collections. Exposes public APIs for the command-line binary and
//! integration testing.

pub mod error;
pub mod models;
pub mod pagination;
pub mod services;
pub mod workflow;

pub use crate::error::{CorpusError, CorpusResult};
pub use crate::models::{WorkAnalysis, WorkDescriptor, WorkIdentity};
pub use crate::services::{CorpusIndex, CorpusScanner, WorkAnalysisBuilder};
pub use crate::workflow::{ingest, IngestReport};
