//! Configuration module for weblog-star
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use weblog_star::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("weblog-star.toml")).unwrap();
//! println!("Reading logs from: {}", config.input.log_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Backoff, Config, GeolocationConfig, InputConfig, OutputConfig, SchemaVariant,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
