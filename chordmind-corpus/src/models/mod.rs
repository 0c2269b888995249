//! Data models for chordmind-corpus
//!
//! - `descriptor`: what the scanner finds (paths + shallow metadata)
//! - `analysis`: what the parser and builder derive from an annotation document

pub mod analysis;
pub mod descriptor;

pub use analysis::{
    CadenceType, Difficulty, FormSection, HarmonicFunction, MeasureFact, Modulation,
    RomanNumeral, WorkAnalysis, WorkHeader, UNKNOWN,
};
pub use descriptor::{CorpusLayout, WorkDescriptor, WorkIdentity};
