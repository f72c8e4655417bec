//! Pipeline module - turns a directory of access logs into star-schema tables
//!
//! This module contains:
//! - The driver that reads files and runs each line through every stage
//! - The star schema layouts the enriched requests accumulate into

mod driver;
pub mod schema;

pub use driver::{discover_logs, LineOutcome, PipelineDriver};
pub use schema::{Request, StarSchema};

use crate::config::Config;
use crate::output::RunStatistics;
use crate::PipelineError;

/// Runs the whole pipeline for a configuration
///
/// # Arguments
///
/// * `config` - A validated configuration
///
/// # Returns
///
/// * `Ok(RunStatistics)` - All tables were written
/// * `Err(PipelineError)` - A fatal I/O or setup failure; no tables were written
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use weblog_star::config::load_config;
/// use weblog_star::pipeline::run_pipeline;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let stats = run_pipeline(config).await?;
/// println!("{} facts", stats.facts);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(config: Config) -> Result<RunStatistics, PipelineError> {
    PipelineDriver::new(config)?.run().await
}
