//! weblog-star: web access logs to star-schema tables
//!
//! This crate reads W3C/IIS extended access logs, classifies each request by
//! browser, operating system and file type, flags crawler traffic, resolves
//! client IPs to a geographic location and writes the result as a set of
//! fact and dimension CSV tables.

pub mod classify;
pub mod config;
pub mod geo;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline runs
///
/// Only resource failures surface here. Malformed lines and failed
/// geolocation lookups are absorbed by the stage that sees them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use classify::{classify, file_type, AgentClassifier, Classification};
pub use config::Config;
pub use geo::{GeoLookup, GeoResolver, Geolocation, RetryPolicy};
pub use pipeline::{run_pipeline, PipelineDriver};
pub use state::{CrawlerDetector, DimensionRegistry};
