//! Output module for writing star-schema tables and run reports
//!
//! This module handles:
//! - The table and dataset types the pipeline materializes
//! - Writing tables as CSV files
//! - Recording and printing run statistics

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::CsvOutput;
pub use stats::{print_statistics, RunStatistics};
pub use traits::{Dataset, OutputError, OutputResult, Table, TableWriter};

use std::path::{Path, PathBuf};

/// Writes every table of a dataset below `output_dir`
///
/// Tables land in `output_dir`, or in the dataset's sub-directory of it when
/// one is set; that directory is created if needed. The tables are committed
/// together: on error no table of the dataset replaces its previous version.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - The written files, in table order
/// * `Err(OutputError)` - A directory or file could not be written
pub fn write_dataset(dataset: &Dataset, output_dir: &Path) -> OutputResult<Vec<PathBuf>> {
    let dir = match dataset.subdirectory {
        Some(sub) => output_dir.join(sub),
        None => output_dir.to_path_buf(),
    };
    let writer = CsvOutput::create(&dir)?;
    writer.write_tables(&dataset.tables)
}
