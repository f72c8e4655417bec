use crate::config::{Backoff, GeolocationConfig};
use std::time::Duration;

/// Bounded retry schedule for geolocation lookups
///
/// | Backoff | Delay after attempt n |
/// |---------|------------------------|
/// | Fixed | `base_delay` |
/// | Exponential | `base_delay * 2^(n-1)` |
///
/// No delay follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is raised to at least 1
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff,
        }
    }

    /// A policy that retries without waiting
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Backoff::Fixed)
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// Returns `None` once no attempts remain.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        };
        Some(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&GeolocationConfig::default())
    }
}

impl From<&GeolocationConfig> for RetryPolicy {
    fn from(config: &GeolocationConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
            config.backoff,
        )
    }
}
