//! Run statistics
//!
//! This module provides the counters collected while a run processes its
//! input, and a formatted report for the terminal.

use crate::geo::GeoStats;

/// Statistics for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Log files read
    pub files_processed: u64,

    /// Raw lines read across all files
    pub lines_read: u64,

    /// `#` directive lines skipped
    pub directives: u64,

    /// Blank lines skipped
    pub blank_lines: u64,

    /// Lines dropped for too few fields or an unparsable date
    pub malformed_lines: u64,

    /// robots.txt requests (recorded for crawler detection, not emitted)
    pub robots_hits: u64,

    /// Fact rows emitted
    pub facts: u64,

    /// Fact rows flagged as crawler traffic
    pub crawler_facts: u64,

    /// Distinct client IPs that requested robots.txt
    pub crawler_ips: u64,

    /// Row count per dimension table, in output order
    pub dimension_rows: Vec<(&'static str, u64)>,

    /// Geolocation resolver counters
    pub geolocation: GeoStats,

    /// Hash of the configuration file the run used, if known
    pub config_hash: Option<String>,
}

impl RunStatistics {
    /// Creates empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines that produced neither a fact nor a robots.txt hit
    pub fn skipped_lines(&self) -> u64 {
        self.directives + self.blank_lines + self.malformed_lines
    }

    /// Share of facts flagged as crawler traffic, as a percentage
    pub fn crawler_rate(&self) -> f64 {
        if self.facts == 0 {
            return 0.0;
        }
        (self.crawler_facts as f64 / self.facts as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");

    if let Some(hash) = &stats.config_hash {
        println!("Config hash: {}\n", hash);
    }

    println!("Input:");
    println!("  Files processed: {}", stats.files_processed);
    println!("  Lines read: {}", stats.lines_read);
    println!("  Directives skipped: {}", stats.directives);
    println!("  Blank lines skipped: {}", stats.blank_lines);
    println!("  Malformed lines skipped: {}", stats.malformed_lines);
    println!("  robots.txt requests: {}", stats.robots_hits);
    println!();

    println!("Facts:");
    println!("  Rows emitted: {}", stats.facts);
    println!(
        "  Crawler rows: {} ({:.1}%) from {} crawler IPs",
        stats.crawler_facts,
        stats.crawler_rate(),
        stats.crawler_ips
    );
    println!();

    if !stats.dimension_rows.is_empty() {
        println!("Dimensions:");
        for (name, rows) in &stats.dimension_rows {
            println!("  {}: {}", name, rows);
        }
        println!();
    }

    let geo = &stats.geolocation;
    println!("Geolocation:");
    println!("  Lookups attempted: {}", geo.attempts);
    println!("  IPs resolved: {}", geo.resolved);
    println!("  IPs unresolved after retries: {}", geo.exhausted);
    println!("  Cache hits: {}", geo.cache_hits);
}
