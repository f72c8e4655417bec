//! Run-scoped state for the pipeline
//!
//! This module holds the order-sensitive state the driver owns for one run.
//!
//! # Components
//!
//! - `CrawlerDetector`: Tracks client IPs that requested robots.txt
//! - `DimensionRegistry`: Assigns surrogate keys to dimension values

mod crawler;
mod registry;

// Re-export main types
pub use crawler::{CrawlerDetector, CrawlerVerdict, ROBOTS_PATH};
pub use registry::{DimensionId, DimensionRegistry};
