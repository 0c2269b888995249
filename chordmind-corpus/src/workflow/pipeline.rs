//! Ingestion pipeline
//!
//! Scan → parallel parse/build → per-document insertion into a fresh
//! [`CorpusIndex`].
//!
//! # Error Handling
//! - Per-document isolation: an unreadable annotation is logged and counted,
//!   never fatal to the batch
//! - Cancellation is checked before each document; the index then holds only
//!   documents that finished before the signal
//! - Only a worker-pool construction failure is returned to the caller

use crate::error::{CorpusError, CorpusResult};
use crate::models::{WorkAnalysis, WorkDescriptor};
use crate::services::annotation_parser;
use crate::services::{CorpusIndex, CorpusScanner, WorkAnalysisBuilder};
use chordmind_common::CorpusConfig;
use rayon::prelude::*;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of processing one descriptor
#[derive(Debug)]
enum DocumentOutcome {
    Built(Box<WorkAnalysis>),
    Failed(CorpusError),
    Cancelled,
}

/// Fresh index plus ingestion counts
#[derive(Debug)]
pub struct IngestReport {
    pub index: CorpusIndex,
    /// Descriptors produced by the scan
    pub found: usize,
    /// Distinct works in the index (always `index.len()`)
    pub admitted: usize,
    /// Documents whose identity repeated an earlier one and replaced it
    pub replaced: usize,
    /// Documents that could not be read
    pub failed: usize,
    /// Documents not started because of cancellation
    pub cancelled_skipped: usize,
    pub cancelled: bool,
    /// Traversal errors reported by the scanner
    pub scan_errors: usize,
}

/// Ingestion pipeline bound to one configuration
pub struct IngestPipeline {
    config: CorpusConfig,
    scanner: CorpusScanner,
    builder: WorkAnalysisBuilder,
}

impl IngestPipeline {
    pub fn new(config: CorpusConfig) -> Self {
        let scanner = CorpusScanner::from_config(&config);
        let builder = WorkAnalysisBuilder::from_config(&config);
        Self {
            config,
            scanner,
            builder,
        }
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Run a full ingestion pass
    pub fn run(&self, cancel: &CancellationToken) -> CorpusResult<IngestReport> {
        let start = Instant::now();
        let root = &self.config.corpus_root;

        info!(root = %root.display(), workers = self.config.workers, "Ingestion started");

        let summary = self.scanner.scan_with_summary(root);
        let descriptors = summary.descriptors;
        let found = descriptors.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("corpus-parser-{i}"))
            .build()
            .map_err(|e| CorpusError::WorkerPool(e.to_string()))?;

        // Each document is parsed and built completely before it is returned
        let outcomes: Vec<(WorkDescriptor, DocumentOutcome)> = pool.install(|| {
            descriptors
                .into_par_iter()
                .map(|descriptor| {
                    let outcome = self.process_document(&descriptor, cancel);
                    (descriptor, outcome)
                })
                .collect()
        });

        let mut index = CorpusIndex::new();
        let mut replaced = 0;
        let mut failed = 0;
        let mut cancelled_skipped = 0;

        for (descriptor, outcome) in outcomes {
            match outcome {
                DocumentOutcome::Built(analysis) => {
                    let work = descriptor.identity();
                    if index.insert(descriptor, *analysis).is_some() {
                        debug!(work = %work, "Duplicate descriptor identity replaced earlier entry");
                        replaced += 1;
                    }
                }
                DocumentOutcome::Failed(e) => {
                    warn!(
                        work = %descriptor.identity(),
                        error = %e,
                        "Document excluded from index"
                    );
                    failed += 1;
                }
                DocumentOutcome::Cancelled => cancelled_skipped += 1,
            }
        }

        let admitted = index.len();
        let cancelled = cancelled_skipped > 0 || cancel.is_cancelled();
        let stats = index.statistics();

        info!(
            found,
            admitted,
            replaced,
            failed,
            cancelled_skipped,
            cancelled,
            analysis_coverage = %stats.analysis_coverage,
            score_coverage = %stats.score_coverage,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Ingestion complete"
        );

        Ok(IngestReport {
            index,
            found,
            admitted,
            replaced,
            failed,
            cancelled_skipped,
            cancelled,
            scan_errors: summary.errors.len(),
        })
    }

    fn process_document(&self, descriptor: &WorkDescriptor, cancel: &CancellationToken) -> DocumentOutcome {
        if cancel.is_cancelled() {
            return DocumentOutcome::Cancelled;
        }

        match annotation_parser::parse_file(&descriptor.analysis_path) {
            Ok(parsed) => DocumentOutcome::Built(Box::new(self.builder.build(descriptor, parsed))),
            Err(e) => DocumentOutcome::Failed(e),
        }
    }
}

/// Scan, parse and index the corpus named by `config`
pub fn ingest(config: &CorpusConfig, cancel: &CancellationToken) -> CorpusResult<IngestReport> {
    IngestPipeline::new(config.clone()).run(cancel)
}
