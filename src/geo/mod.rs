//! IP geolocation
//!
//! This module resolves client IPs to a postal/city/region/country tuple:
//! - `GeoLookup`: one round trip to a remote service
//! - `IpApiClient`: reqwest implementation for ip-api.com compatible services
//! - `RetryPolicy`: bounded attempts with fixed or exponential backoff
//! - `GeoResolver`: per-run cache in front of the lookup, never fails

mod client;
mod resolver;
mod retry;

pub use client::{build_http_client, GeoLookup, IpApiClient, LookupError};
pub use resolver::{GeoResolver, GeoStats};
pub use retry::RetryPolicy;

use crate::classify::UNKNOWN;

/// Geographic origin of a client IP
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Geolocation {
    pub postcode: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Geolocation {
    /// The record returned when an IP cannot be resolved
    pub fn unknown() -> Self {
        Self {
            postcode: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            state: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }

    /// Returns true if every field is the unknown sentinel
    pub fn is_unknown(&self) -> bool {
        [&self.postcode, &self.city, &self.state, &self.country]
            .iter()
            .all(|field| field.as_str() == UNKNOWN)
    }
}
