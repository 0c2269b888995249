//! chordmind-corpus - corpus ingestion and harmonic analysis command line
//!
//! Every command performs one ingestion pass over the corpus root, then
//! reports on the resulting index. Ctrl+C cancels an in-flight pass; the
//! command then reports on the documents processed so far.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chordmind_common::{ConfigResolver, CorpusConfig, LoggingConfig};
use chordmind_corpus::services::{
    analyze_score, classify_period, export_to_dir, page, training_samples, write_training_jsonl,
    ExportFormat,
};
use chordmind_corpus::{ingest, IngestReport};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for chordmind-corpus
#[derive(Parser, Debug)]
#[command(name = "chordmind-corpus")]
#[command(about = "Roman-numeral corpus ingestion and harmonic analysis")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus root folder (one directory per corpus family)
    #[arg(short = 'r', long)]
    corpus_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the corpus and print ingestion counts
    Scan,
    /// Print corpus statistics as JSON
    Stats,
    /// Case-insensitive search over title, composer and family
    Search { query: String },
    /// List indexed works, optionally filtered, one page at a time
    List {
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        composer: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = chordmind_corpus::pagination::DEFAULT_PAGE_SIZE)]
        size: usize,
    },
    /// Print the quality report and difficulty buckets
    Quality {
        /// Number of keys in the key-usage ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Analyze the annotation document belonging to a score file
    Analyze { score: PathBuf },
    /// Write a timestamped export file
    Export {
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Output directory (defaults to the configured export_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Emit flattened training text (JSON lines to a file, or plain lines to stdout)
    TrainingText {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolution = ConfigResolver::new()
        .with_config_file(args.config.clone())
        .with_corpus_root(args.corpus_root.clone())
        .resolve_detailed()
        .context("Failed to resolve configuration")?;

    init_tracing(&resolution.config.logging)?;

    // Log build identification immediately after tracing init
    info!(
        "Starting chordmind-corpus v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    resolution.log();
    let config = resolution.config;
    info!("Corpus root: {}", config.corpus_root.display());

    if let Command::Analyze { score } = &args.command {
        return analyze(score, &config);
    }

    let report = run_ingest(config.clone()).await?;
    if report.cancelled {
        warn!(
            skipped = report.cancelled_skipped,
            "Scan cancelled; reporting on documents processed so far"
        );
    }

    match args.command {
        Command::Scan => print_scan(&report),
        Command::Stats => {
            let stats = report.index.statistics();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Search { query } => {
            let result = report.index.search(&query);
            for entry in &result.items {
                println!("{}\t{}", entry.identity(), entry.title());
            }
            println!("{} match(es)", result.total);
        }
        Command::List {
            family,
            composer,
            page: page_number,
            size,
        } => {
            let items = report.index.filter(family.as_deref(), composer.as_deref());
            let listing = page(&items, page_number, size);
            for entry in &listing.items {
                println!(
                    "{}\t{}\t{} measures\t{}",
                    entry.identity(),
                    entry.title(),
                    entry.analysis.total_measures,
                    classify_period(&entry.descriptor.composer, &entry.descriptor.family)
                );
            }
            println!(
                "page {}/{} ({} items)",
                listing.page, listing.total_pages, listing.total
            );
        }
        Command::Quality { top } => {
            let quality = report.index.quality_report(top);
            println!("{}", serde_json::to_string_pretty(&quality)?);
            for (difficulty, entries) in report.index.group_by_difficulty() {
                println!("{}: {}", difficulty, entries.len());
            }
        }
        Command::Export { format, out } => {
            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let path = export_to_dir(&report.index, &dir, format)
                .with_context(|| format!("Export to {} failed", dir.display()))?;
            println!("{}", path.display());
        }
        Command::TrainingText { out } => match out {
            Some(path) => {
                let written = write_training_jsonl(&report.index, &path)
                    .with_context(|| format!("Writing {} failed", path.display()))?;
                println!("{} samples written to {}", written, path.display());
            }
            None => {
                for sample in training_samples(&report.index) {
                    println!("{}", sample.text);
                }
            }
        },
        Command::Analyze { .. } => {}
    }

    Ok(())
}

/// Install the fmt subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let (file_layer, stderr_layer) = match &logging.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

/// Run one ingestion pass on the blocking pool, cancelled by Ctrl+C
async fn run_ingest(config: CorpusConfig) -> Result<IngestReport> {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, cancelling scan");
            signal_token.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || ingest(&config, &cancel))
        .await
        .context("Ingestion task failed")??;

    Ok(report)
}

fn print_scan(report: &IngestReport) {
    let stats = report.index.statistics();
    println!("found:     {}", report.found);
    println!("admitted:  {}", report.admitted);
    if report.replaced > 0 {
        println!("replaced:  {} duplicate identities", report.replaced);
    }
    println!("failed:    {}", report.failed);
    if report.cancelled {
        println!("cancelled: {} not processed", report.cancelled_skipped);
    }
    println!("analysis coverage: {}", stats.analysis_coverage);
    println!("score coverage:    {}", stats.score_coverage);
    for (family, count) in &stats.family_distribution {
        println!("  {family}: {count}");
    }
}

fn analyze(score: &Path, config: &CorpusConfig) -> Result<()> {
    match analyze_score(score, config)
        .with_context(|| format!("Analysis of {} failed", score.display()))?
    {
        Some(analysis) => {
            println!("{} - {}", analysis.header.composer, analysis.header.title);
            println!("key:          {}", analysis.header.key_signature);
            println!("measures:     {}", analysis.total_measures);
            println!("cadences:     {:?}", analysis.cadence_labels());
            println!("modulations:  {:?}", analysis.modulation_labels());
            println!("complexity:   {:.3}", analysis.complexity);
            println!("difficulty:   {}", analysis.difficulty());
        }
        None => println!("No annotation document found for {}", score.display()),
    }
    Ok(())
}
