//! Error types for chordmind-corpus
//!
//! Failure taxonomy:
//! - `RootNotFound`, `DocumentUnreadable`, `MalformedLine`, `MalformedHeader`
//!   are non-fatal. They are logged and counted but never escape a corpus scan.
//! - `ExportTarget` fails only the export call that hit it; the index is untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Corpus engine error type
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Corpus root folder does not exist
    #[error("Corpus root not found: {0}")]
    RootNotFound(PathBuf),

    /// Annotation document could not be read
    #[error("Document unreadable {path}: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },

    /// Measure line that yields no fact
    #[error("Malformed line {line_number}: {reason}")]
    MalformedLine { line_number: usize, reason: String },

    /// Header line whose value could not be used
    #[error("Malformed header {field}: {reason}")]
    MalformedHeader { field: String, reason: String },

    /// Export destination could not be written or read back
    #[error("Export target error {path}: {reason}")]
    ExportTarget { path: PathBuf, reason: String },

    /// Family manifest could not be read
    #[error("Manifest error {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Parser worker pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// chordmind-common error
    #[error("Common error: {0}")]
    Common(#[from] chordmind_common::Error),
}

impl CorpusError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CorpusError::DocumentUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn export_target(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CorpusError::ExportTarget {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CorpusError::Manifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether a corpus scan may continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CorpusError::RootNotFound(_)
                | CorpusError::DocumentUnreadable { .. }
                | CorpusError::MalformedLine { .. }
                | CorpusError::MalformedHeader { .. }
                | CorpusError::Manifest { .. }
        )
    }
}

/// Result type for corpus operations
pub type CorpusResult<T> = Result<T, CorpusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_taxonomy() {
        assert!(CorpusError::RootNotFound(PathBuf::from("/x")).is_recoverable());
        assert!(CorpusError::unreadable("/x/analysis.txt", "denied").is_recoverable());
        assert!(!CorpusError::export_target("/out.csv", "read-only").is_recoverable());
        assert!(!CorpusError::WorkerPool("no threads".into()).is_recoverable());
    }

    #[test]
    fn test_display_includes_path() {
        let err = CorpusError::unreadable("/corpus/a/analysis.txt", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("/corpus/a/analysis.txt"));
        assert!(msg.contains("permission denied"));
    }
}
