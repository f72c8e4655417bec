//! Crawler detection based on robots.txt requests

use std::collections::HashSet;

/// URI stem whose request marks a client as a crawler
pub const ROBOTS_PATH: &str = "/robots.txt";

/// Outcome of observing one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlerVerdict {
    /// The request fetched robots.txt; it is recorded and produces no fact
    RobotsHit,

    /// Any other request
    Request {
        /// Whether the client had fetched robots.txt before this request
        is_crawler: bool,
    },
}

/// Tracks client IPs that requested robots.txt during a run
///
/// Detection is order sensitive. A request is flagged only if its client
/// fetched robots.txt *earlier* in the pass; requests made before the first
/// robots.txt hit stay unflagged.
#[derive(Debug, Clone, Default)]
pub struct CrawlerDetector {
    crawler_ips: HashSet<String>,
}

impl CrawlerDetector {
    /// Creates an empty detector
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes one request in processing order
    ///
    /// # Arguments
    ///
    /// * `uri_stem` - The requested path, compared exactly against [`ROBOTS_PATH`]
    /// * `client_ip` - The requesting client
    pub fn observe(&mut self, uri_stem: &str, client_ip: &str) -> CrawlerVerdict {
        if uri_stem == ROBOTS_PATH {
            if self.crawler_ips.insert(client_ip.to_string()) {
                tracing::debug!("Client {} requested robots.txt, flagging as crawler", client_ip);
            }
            return CrawlerVerdict::RobotsHit;
        }

        CrawlerVerdict::Request {
            is_crawler: self.is_crawler(client_ip),
        }
    }

    /// Returns true if the client has requested robots.txt so far
    pub fn is_crawler(&self, client_ip: &str) -> bool {
        self.crawler_ips.contains(client_ip)
    }

    /// Number of distinct crawler IPs seen so far
    pub fn len(&self) -> usize {
        self.crawler_ips.len()
    }

    /// Returns true if no crawler has been seen
    pub fn is_empty(&self) -> bool {
        self.crawler_ips.is_empty()
    }
}
