//! Configuration loading and corpus root resolution
//!
//! Resolution priority for the corpus root:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `CHORDMIND_CORPUS_ROOT`
//! 3. TOML config file (`corpus_root`)
//! 4. Compiled default (fallback)
//!
//! A missing config file never stops startup: a warning is logged and the
//! compiled defaults are used. A config file that exists but does not parse
//! is reported as [`Error::Config`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the corpus root folder
pub const CORPUS_ROOT_ENV: &str = "CHORDMIND_CORPUS_ROOT";

/// Environment variable naming the TOML config file
pub const CONFIG_FILE_ENV: &str = "CHORDMIND_CONFIG";

/// Default corpus location, relative to the working directory
pub const DEFAULT_CORPUS_ROOT: &str = "../When-in-Rome/Corpus";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    pub level: String,
    /// Append log output to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Complexity score weights
///
/// The weights are a tunable policy. Any non-negative values keep the score
/// monotonic in measures, distinct keys, distinct functions and
/// extended-harmony markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    pub per_measure: f64,
    pub per_key: f64,
    pub per_function: f64,
    pub per_extended: f64,
    /// Upper clamp for the final score
    pub ceiling: f64,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            per_measure: 0.002,
            per_key: 0.04,
            per_function: 0.03,
            per_extended: 0.01,
            ceiling: 1.0,
        }
    }
}

/// On-disk shape of the TOML config file (every field optional)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub corpus_root: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub annotation_filename: Option<String>,
    pub score_extensions: Option<Vec<String>>,
    pub manifest_extension: Option<String>,
    pub workers: Option<usize>,
    pub logging: LoggingConfig,
    pub complexity: ComplexityConfig,
}

/// Fully resolved corpus configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusConfig {
    /// Root folder holding one directory per corpus family
    pub corpus_root: PathBuf,
    /// Directory receiving timestamped exports
    pub export_dir: PathBuf,
    /// Canonical annotation document name inside a work/movement folder
    pub annotation_filename: String,
    /// Score file extensions, lowercase, without the dot
    pub score_extensions: Vec<String>,
    /// Extension of `<family>_contents.<ext>` manifests
    pub manifest_extension: String,
    /// Parser worker threads (0 = one per available CPU)
    pub workers: usize,
    pub logging: LoggingConfig,
    pub complexity: ComplexityConfig,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from(DEFAULT_CORPUS_ROOT),
            export_dir: PathBuf::from("exports"),
            annotation_filename: "analysis.txt".to_string(),
            score_extensions: ["mxl", "xml", "mid", "midi"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            manifest_extension: "tsv".to_string(),
            workers: 0,
            logging: LoggingConfig::default(),
            complexity: ComplexityConfig::default(),
        }
    }
}

impl CorpusConfig {
    /// Config rooted at `corpus_root` with every other field defaulted
    pub fn for_root(corpus_root: impl Into<PathBuf>) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            ..Self::default()
        }
    }

    /// Overlay the values present in a TOML file onto the defaults
    fn from_toml(toml: TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            corpus_root: toml.corpus_root.unwrap_or(defaults.corpus_root),
            export_dir: toml.export_dir.unwrap_or(defaults.export_dir),
            annotation_filename: toml
                .annotation_filename
                .unwrap_or(defaults.annotation_filename),
            score_extensions: toml
                .score_extensions
                .map(|exts| {
                    exts.into_iter()
                        .map(|e| e.trim_start_matches('.').to_lowercase())
                        .collect()
                })
                .unwrap_or(defaults.score_extensions),
            manifest_extension: toml
                .manifest_extension
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or(defaults.manifest_extension),
            workers: toml.workers.unwrap_or(defaults.workers),
            logging: toml.logging,
            complexity: toml.complexity,
        }
    }
}

/// Resolves the config file and corpus root in priority order
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_config: Option<PathBuf>,
    cli_corpus_root: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config file given on the command line
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config = path;
        self
    }

    /// Corpus root given on the command line
    pub fn with_corpus_root(mut self, path: Option<PathBuf>) -> Self {
        self.cli_corpus_root = path;
        self
    }

    /// Config file location: CLI → ENV → platform config dir
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        dirs::config_dir().map(|d| d.join("chordmind").join("corpus.toml"))
    }

    /// Load the TOML file, degrading to defaults when it is absent
    pub fn load_toml(&self) -> Result<(TomlConfig, ConfigSource)> {
        match self.config_path() {
            Some(path) if path.exists() => {
                let toml = load_toml_config(&path)?;
                Ok((toml, ConfigSource::File(path)))
            }
            Some(path) => Ok((TomlConfig::default(), ConfigSource::Missing(path))),
            None => Ok((TomlConfig::default(), ConfigSource::NoConfigDir)),
        }
    }

    /// Produce the effective configuration and record where it came from
    ///
    /// Nothing is logged here; call [`Resolution::log`] once a subscriber is
    /// installed.
    pub fn resolve_detailed(&self) -> Result<Resolution> {
        let (toml, config_source) = self.load_toml()?;
        let mut config = CorpusConfig::from_toml(toml);

        // Priority 1: Command-line argument
        let root_source = if let Some(root) = &self.cli_corpus_root {
            config.corpus_root = root.clone();
            RootSource::CommandLine
        } else {
            // Priority 2: Environment variable
            match std::env::var(CORPUS_ROOT_ENV) {
                Ok(root) if !root.trim().is_empty() => {
                    config.corpus_root = PathBuf::from(root);
                    RootSource::Environment
                }
                // Priorities 3 and 4 were applied by from_toml
                _ => RootSource::ConfigOrDefault,
            }
        };

        Ok(Resolution {
            config,
            config_source,
            root_source,
        })
    }

    /// Produce the effective configuration, logging how it was resolved
    pub fn resolve(&self) -> Result<CorpusConfig> {
        let resolution = self.resolve_detailed()?;
        resolution.log();
        Ok(resolution.config)
    }
}

/// Where the TOML settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Named file does not exist; compiled defaults in effect
    Missing(PathBuf),
    /// No platform config directory; compiled defaults in effect
    NoConfigDir,
}

/// Which priority level supplied the corpus root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    CommandLine,
    Environment,
    ConfigOrDefault,
}

/// Effective configuration plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub config: CorpusConfig,
    pub config_source: ConfigSource,
    pub root_source: RootSource,
}

impl Resolution {
    /// Emit the resolution notes through `tracing`
    pub fn log(&self) {
        match &self.config_source {
            ConfigSource::File(path) => info!(path = %path.display(), "Loaded config file"),
            ConfigSource::Missing(path) => warn!(
                path = %path.display(),
                "Config file not found, using compiled defaults"
            ),
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using compiled defaults")
            }
        }

        let root = self.config.corpus_root.display();
        match self.root_source {
            RootSource::CommandLine => info!(corpus_root = %root, "Corpus root from command line"),
            RootSource::Environment => info!(corpus_root = %root, "Corpus root from environment"),
            RootSource::ConfigOrDefault => {
                debug!(corpus_root = %root, "Corpus root from config file or default")
            }
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    Ok(config)
}
