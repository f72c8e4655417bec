//! Cached, retrying geolocation resolution
//!
//! Resolutions are memoized for the lifetime of the resolver. Each IP has a
//! slot in the cache; concurrent callers for the same uncached IP wait on
//! that slot while a single lookup sequence runs, so no IP ever has more than
//! one request in flight.

use crate::geo::{GeoLookup, Geolocation, RetryPolicy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Counters describing resolver activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoStats {
    /// Lookup requests issued, retries included
    pub attempts: u64,
    /// IPs resolved from the service
    pub resolved: u64,
    /// Resolutions that ran out of attempts
    pub exhausted: u64,
    /// Resolutions answered from the cache
    pub cache_hits: u64,
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    resolved: AtomicU64,
    exhausted: AtomicU64,
    cache_hits: AtomicU64,
}

/// All attempts for an IP failed
struct Exhausted;

/// Resolves IPs to locations with a per-run cache
///
/// `resolve` never fails: when the retry budget is spent it returns
/// [`Geolocation::unknown`]. That sentinel is not cached, so a later request
/// for the same IP tries the service again.
pub struct GeoResolver {
    lookup: Box<dyn GeoLookup>,
    policy: RetryPolicy,
    cache: Mutex<HashMap<String, Arc<OnceCell<Geolocation>>>>,
    counters: Counters,
}

impl GeoResolver {
    /// Creates a resolver with an empty cache
    ///
    /// # Arguments
    ///
    /// * `lookup` - The service client
    /// * `policy` - Attempt budget and delay schedule
    pub fn new(lookup: Box<dyn GeoLookup>, policy: RetryPolicy) -> Self {
        Self {
            lookup,
            policy,
            cache: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Resolves an IP, from the cache when possible
    pub async fn resolve(&self, ip: &str) -> Geolocation {
        let slot = self.slot(ip);

        if let Some(geolocation) = slot.get() {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Cache hit for IP: {}", ip);
            return geolocation.clone();
        }

        match slot.get_or_try_init(|| self.fetch_with_retry(ip)).await {
            Ok(geolocation) => geolocation.clone(),
            Err(Exhausted) => {
                self.release(ip, &slot);
                Geolocation::unknown()
            }
        }
    }

    /// Returns the cached location of an IP without any network access
    pub fn cached(&self, ip: &str) -> Option<Geolocation> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(ip).and_then(|slot| slot.get().cloned())
    }

    /// Number of IPs with a cached location
    pub fn cached_len(&self) -> usize {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.values().filter(|slot| slot.initialized()).count()
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> GeoStats {
        GeoStats {
            attempts: self.counters.attempts.load(Ordering::Relaxed),
            resolved: self.counters.resolved.load(Ordering::Relaxed),
            exhausted: self.counters.exhausted.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, ip: &str) -> Arc<OnceCell<Geolocation>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(ip.to_string()).or_default())
    }

    /// Drops an empty slot nobody else is waiting on
    fn release(&self, ip: &str, slot: &Arc<OnceCell<Geolocation>>) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = cache.get(ip).is_some_and(|cached| {
            Arc::ptr_eq(cached, slot) && !cached.initialized() && Arc::strong_count(cached) == 2
        });
        if unused {
            cache.remove(ip);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    async fn fetch_with_retry(&self, ip: &str) -> Result<Geolocation, Exhausted> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.counters.attempts.fetch_add(1, Ordering::Relaxed);

            match self.lookup.lookup(ip).await {
                Ok(geolocation) => {
                    self.counters.resolved.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        "Fetched geolocation for IP {}: {}, {}, {}",
                        ip,
                        geolocation.city,
                        geolocation.state,
                        geolocation.country
                    );
                    return Ok(geolocation);
                }
                Err(e) => match self.policy.delay_after(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            "Geolocation lookup for {} failed (attempt {}/{}), retrying in {:?}: {}",
                            ip,
                            attempt,
                            self.policy.max_attempts,
                            delay,
                            e
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            "Max retries reached for IP {}, using unknown geolocation: {}",
                            ip,
                            e
                        );
                        return Err(Exhausted);
                    }
                },
            }
        }
    }
}
