//! HTTP client for the geolocation service
//!
//! This module handles the network side of geolocation:
//! - Building an HTTP client with the configured timeout
//! - One GET request per lookup against an ip-api.com compatible endpoint
//! - Error classification (timeout, rate limit, HTTP status, decode)

use crate::classify::UNKNOWN;
use crate::config::GeolocationConfig;
use crate::geo::Geolocation;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single lookup attempt
///
/// Every variant is treated as transient by the resolver.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited by geolocation service (HTTP 429)")]
    RateLimited,

    #[error("Geolocation service returned HTTP {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// One round trip to a geolocation service
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Looks up the location of `ip`
    async fn lookup(&self, ip: &str) -> Result<Geolocation, LookupError>;
}

/// Response body of an ip-api.com style service
///
/// Only the fields the schema needs are read. Missing or null fields fall
/// back to the unknown sentinel.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    zip: Option<String>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
}

impl From<IpApiResponse> for Geolocation {
    fn from(response: IpApiResponse) -> Self {
        let or_unknown = |field: Option<String>| field.unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            postcode: or_unknown(response.zip),
            city: or_unknown(response.city),
            state: or_unknown(response.region_name),
            country: or_unknown(response.country),
        }
    }
}

/// Builds an HTTP client for geolocation lookups
///
/// # Arguments
///
/// * `timeout` - Upper bound for one request, connection included
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .build()
}

/// Geolocation client for ip-api.com compatible endpoints
///
/// Requests `GET {endpoint}/{ip}` and reads `zip`, `city`, `regionName`
/// and `country` from the JSON body.
#[derive(Debug, Clone)]
pub struct IpApiClient {
    client: Client,
    endpoint: String,
}

impl IpApiClient {
    /// Creates a client from the geolocation configuration
    pub fn new(config: &GeolocationConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_client(client, &config.endpoint))
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// The URL queried for `ip`
    pub fn lookup_url(&self, ip: &str) -> String {
        format!("{}/{}", self.endpoint, ip)
    }
}

#[async_trait]
impl GeoLookup for IpApiClient {
    async fn lookup(&self, ip: &str) -> Result<Geolocation, LookupError> {
        let response = self
            .client
            .get(self.lookup_url(ip))
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::RateLimited);
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::Decode(e.to_string())
            }
        })?;

        Ok(body.into())
    }
}

/// Maps a transport error onto a lookup error
fn classify_error(error: reqwest::Error) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Network(error.to_string())
    }
}
