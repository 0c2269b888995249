//! Corpus ingestion workflow
//!
//! One pass over the corpus root produces a fresh, caller-owned index.
//! Callers serialize passes over the same root.

pub mod pipeline;

pub use pipeline::{ingest, IngestPipeline, IngestReport};
