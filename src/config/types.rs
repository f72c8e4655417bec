use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for weblog-star
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

/// Where access logs are read from
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Directory holding the log files (not searched recursively)
    #[serde(rename = "log-dir")]
    pub log_dir: PathBuf,

    /// File extension that marks a log file, without the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the CSV tables are written to; created if absent
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Table layout to produce
    #[serde(default)]
    pub schema: SchemaVariant,
}

/// Star schema layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaVariant {
    /// One dimension table keyed by (browser, OS, file type), geolocation inline in facts
    #[default]
    Combined,

    /// One table per dimension under a `staging/` sub-directory
    Staged,
}

impl SchemaVariant {
    /// Returns the configuration name of this variant
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::Staged => "staged",
        }
    }
}

/// Geolocation service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationConfig {
    /// Base URL; the client IP is appended as the last path segment
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of lookups made for one IP before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// How the retry delay grows between attempts
    #[serde(default)]
    pub backoff: Backoff,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff: Backoff::default(),
        }
    }
}

/// Retry delay growth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,

    /// Delay doubles after each failed attempt
    #[default]
    Exponential,
}

fn default_extension() -> String {
    "log".to_string()
}

fn default_endpoint() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}
