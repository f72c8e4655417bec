//! Pipeline driver - end-to-end run orchestration
//!
//! This module ties the stages together:
//! - Discovering log files in the input directory
//! - Reading each file line by line
//! - Classifying, crawler-flagging and geolocating each request
//! - Accumulating the star schema and writing it once input is exhausted

use crate::classify::{file_type, AgentClassifier};
use crate::config::Config;
use crate::geo::{GeoLookup, GeoResolver, IpApiClient, RetryPolicy};
use crate::output::{write_dataset, CsvOutput, Dataset, RunStatistics};
use crate::parse::{parse_line, ParsedLine};
use crate::pipeline::schema::{Request, StarSchema};
use crate::state::{CrawlerDetector, CrawlerVerdict};
use crate::PipelineError;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// What happened to one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Directive,
    Blank,
    /// Too few fields, or a date the schema cannot store
    Malformed,
    /// robots.txt request; marks the client as a crawler, emits no fact
    RobotsHit,
    Fact { is_crawler: bool },
}

/// Drives one run over a directory of access logs
pub struct PipelineDriver {
    config: Config,
    classifier: AgentClassifier,
    crawlers: CrawlerDetector,
    resolver: GeoResolver,
    schema: StarSchema,
    stats: RunStatistics,
}

impl PipelineDriver {
    /// Creates a driver that geolocates through the configured HTTP endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineDriver)` - Ready to run
    /// * `Err(PipelineError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let lookup = IpApiClient::new(&config.geolocation)?;
        Ok(Self::with_lookup(config, Box::new(lookup)))
    }

    /// Creates a driver around any geolocation service
    pub fn with_lookup(config: Config, lookup: Box<dyn GeoLookup>) -> Self {
        let policy = RetryPolicy::from(&config.geolocation);
        let schema = StarSchema::new(config.output.schema);

        Self {
            classifier: AgentClassifier::builtin(),
            crawlers: CrawlerDetector::new(),
            resolver: GeoResolver::new(lookup, policy),
            schema,
            stats: RunStatistics::new(),
            config,
        }
    }

    /// Runs the pipeline to completion
    ///
    /// 1. Lists the log files (a missing input directory is fatal)
    /// 2. Creates the output directory
    /// 3. Processes every file in name order
    /// 4. Writes the dimension and fact tables
    pub async fn run(mut self) -> Result<RunStatistics, PipelineError> {
        let files = discover_logs(&self.config.input.log_dir, &self.config.input.extension)?;
        if files.is_empty() {
            tracing::warn!(
                "No .{} files found in {}",
                self.config.input.extension,
                self.config.input.log_dir.display()
            );
        }

        let output_dir = self.config.output.output_dir.clone();
        CsvOutput::create(&output_dir)?;

        tracing::info!(
            "Processing {} log files with the {} schema",
            files.len(),
            self.config.output.schema.as_str()
        );
        let start_time = std::time::Instant::now();

        for (index, path) in files.iter().enumerate() {
            self.process_file(path).await?;
            tracing::info!(
                "Progress: {}/{} files, {} facts, {} crawler IPs",
                index + 1,
                files.len(),
                self.schema.fact_count(),
                self.crawlers.len()
            );
        }

        let (dataset, stats) = self.finish();
        let written = write_dataset(&dataset, &output_dir)?;

        tracing::info!(
            "Run completed: {} facts in {} tables, {:?}",
            stats.facts,
            written.len(),
            start_time.elapsed()
        );

        Ok(stats)
    }

    /// Reads one log file and processes every line of it
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub async fn process_file(&mut self, path: &Path) -> Result<(), PipelineError> {
        let io_error = |source| PipelineError::LogFile {
            path: path.to_path_buf(),
            source,
        };

        tracing::debug!("Reading {}", path.display());
        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut first = true;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).await.map_err(io_error)?;
            if read == 0 {
                break;
            }

            let decoded = String::from_utf8_lossy(&buf);
            let mut line = decoded.trim_end_matches(['\r', '\n']);
            if first {
                line = line.trim_start_matches('\u{feff}');
                first = false;
            }

            self.process_line(line).await;
        }

        self.stats.files_processed += 1;
        Ok(())
    }

    /// Runs one line through every stage
    pub async fn process_line(&mut self, line: &str) -> LineOutcome {
        self.stats.lines_read += 1;

        let record = match parse_line(line) {
            ParsedLine::Directive => {
                self.stats.directives += 1;
                return LineOutcome::Directive;
            }
            ParsedLine::Blank => {
                self.stats.blank_lines += 1;
                return LineOutcome::Blank;
            }
            ParsedLine::Short { fields } => {
                tracing::debug!("Skipping line with {} fields: {}", fields, line);
                self.stats.malformed_lines += 1;
                return LineOutcome::Malformed;
            }
            ParsedLine::Record(record) => record,
        };

        // Crawler state is updated before any layout check
        let is_crawler = match self.crawlers.observe(&record.uri_stem, &record.client_ip) {
            CrawlerVerdict::RobotsHit => {
                self.stats.robots_hits += 1;
                return LineOutcome::RobotsHit;
            }
            CrawlerVerdict::Request { is_crawler } => is_crawler,
        };

        if !self.schema.accepts(&record) {
            tracing::debug!("Skipping line with unparsable date {:?}", record.date);
            self.stats.malformed_lines += 1;
            return LineOutcome::Malformed;
        }

        let classification = self.classifier.classify(&record.user_agent);
        let file_type = file_type(&record.uri_stem);

        let geolocation = self.resolver.resolve(&record.client_ip).await;

        let request = Request {
            record,
            classification,
            file_type,
            geolocation,
            is_crawler,
        };
        if !self.schema.append(request) {
            self.stats.malformed_lines += 1;
            return LineOutcome::Malformed;
        }

        self.stats.facts += 1;
        if is_crawler {
            self.stats.crawler_facts += 1;
        }
        LineOutcome::Fact { is_crawler }
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Consumes the driver, returning the tables and final statistics
    pub fn finish(self) -> (Dataset, RunStatistics) {
        let mut stats = self.stats;
        stats.crawler_ips = self.crawlers.len() as u64;
        stats.dimension_rows = self.schema.dimension_counts();
        stats.geolocation = self.resolver.stats();

        (self.schema.into_dataset(), stats)
    }
}

/// Lists the log files directly inside `dir`, sorted by file name
///
/// # Arguments
///
/// * `dir` - The input directory (not searched recursively)
/// * `extension` - Extension without the leading dot
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Matching files, possibly none
/// * `Err(PipelineError::InputDir)` - The directory could not be listed
pub fn discover_logs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let io_error = |source| PipelineError::InputDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
