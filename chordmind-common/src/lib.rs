//! # ChordMind Common Library
//!
//! Shared code for the ChordMind corpus tooling:
//! - Error type used across crates
//! - TOML configuration loading and corpus root resolution

pub mod config;
pub mod error;

pub use config::{
    ComplexityConfig, ConfigResolver, ConfigSource, CorpusConfig, LoggingConfig, Resolution,
    RootSource, TomlConfig,
};
pub use error::{Error, Result};
