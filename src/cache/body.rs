//! Single-body cache.
//!
//! One record per catalog body, fetched in full mode. The slot for a
//! body is an explicit state machine — idle (nothing in either map),
//! fetching (an in-flight shared future other callers join), or cached
//! (a record, possibly expired, kept for frozen fallbacks). At most
//! one upstream fetch per body is ever in flight; the in-flight slot
//! is cleared before any waiter settles, so a slot can never stick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{info, warn};

use crate::cache::record::{CachePolicy, CacheRecord, CacheStatus, Freshness};
use crate::error::{OrreryError, Result};
use crate::horizons::EphemerisSource;
use crate::telemetry;
use crate::types::{BodyDescriptor, FetchMode, StateVector};

type SharedFetch =
    Shared<BoxFuture<'static, std::result::Result<CacheRecord<StateVector>, Arc<OrreryError>>>>;

/// A decorated read from the single-body cache.
#[derive(Debug, Clone)]
pub struct BodyReading {
    pub vector: Arc<StateVector>,
    pub status: CacheStatus,
    pub age: Duration,
    pub expires_in: Duration,
    pub generated_at: DateTime<Utc>,
    /// Set when `status == Frozen`: why the live refresh failed.
    pub freeze_reason: Option<String>,
}

impl BodyReading {
    fn from_record(record: &CacheRecord<StateVector>, status: CacheStatus) -> Self {
        Self {
            vector: Arc::clone(record.payload()),
            status,
            age: record.age(),
            expires_in: record.expires_in(),
            generated_at: record.generated_at(),
            freeze_reason: None,
        }
    }
}

/// Per-body ephemeris cache with request coalescing and frozen
/// fallback. See the policy in [`get`](SingleBodyCache::get).
///
/// A cheap handle: clones share the underlying state.
#[derive(Clone)]
pub struct SingleBodyCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    source: Arc<dyn EphemerisSource>,
    policy: CachePolicy,
    records: Mutex<HashMap<String, CacheRecord<StateVector>>>,
    inflight: Mutex<HashMap<String, SharedFetch>>,
}

impl SingleBodyCache {
    pub fn new(source: Arc<dyn EphemerisSource>, policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                policy,
                records: Mutex::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Get a body's state vector, from cache when fresh.
    ///
    /// - Fresh record, no `force_refresh`: HIT.
    /// - Otherwise fetch (joining any in-flight fetch for this body):
    ///   MISS on success.
    /// - Fetch failed with a previous record at any age: FROZEN, with
    ///   the failure as `freeze_reason`.
    /// - Fetch failed with nothing cached: the failure propagates.
    pub async fn get(&self, body: &BodyDescriptor, force_refresh: bool) -> Result<BodyReading> {
        if !force_refresh {
            let hit = {
                let records = self.inner.records.lock().expect("body records poisoned");
                records
                    .get(&body.id)
                    .filter(|r| r.freshness() == Freshness::Fresh)
                    .cloned()
            };
            if let Some(record) = hit {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => "body").increment(1);
                return Ok(BodyReading::from_record(&record, CacheStatus::Hit));
            }
        }

        let fetch = self.join_or_start_fetch(body);
        match fetch.await {
            Ok(record) => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "body").increment(1);
                let mut reading = BodyReading::from_record(&record, CacheStatus::Miss);
                reading.age = Duration::ZERO;
                Ok(reading)
            }
            Err(err) => self.freeze_or_propagate(body, &err),
        }
    }

    /// Join the in-flight fetch for this body, or start one.
    fn join_or_start_fetch(&self, body: &BodyDescriptor) -> SharedFetch {
        let mut inflight = self.inner.inflight.lock().expect("body inflight poisoned");
        if let Some(pending) = inflight.get(&body.id) {
            return pending.clone();
        }

        let cache = self.clone();
        let descriptor = body.clone();
        let fetch = async move {
            let result = cache.refresh(&descriptor).await.map_err(Arc::new);
            // clear the slot before any waiter settles
            cache
                .inner
                .inflight
                .lock()
                .expect("body inflight poisoned")
                .remove(&descriptor.id);
            result
        }
        .boxed()
        .shared();
        inflight.insert(body.id.clone(), fetch.clone());
        fetch
    }

    async fn refresh(&self, body: &BodyDescriptor) -> Result<CacheRecord<StateVector>> {
        let vector = self.inner.source.fetch(body, FetchMode::Full).await?;
        let record = CacheRecord::new(vector, &self.inner.policy);
        info!(body = %body.id, "refreshed body ephemeris");
        self.inner
            .records
            .lock()
            .expect("body records poisoned")
            .insert(body.id.clone(), record.clone());
        Ok(record)
    }

    fn freeze_or_propagate(&self, body: &BodyDescriptor, err: &OrreryError) -> Result<BodyReading> {
        let previous = {
            let records = self.inner.records.lock().expect("body records poisoned");
            records.get(&body.id).cloned()
        };
        match previous {
            Some(record) => {
                warn!(body = %body.id, error = %err, "serving frozen body snapshot");
                metrics::counter!(telemetry::FROZEN_SERVES_TOTAL, "cache" => "body").increment(1);
                let mut reading = BodyReading::from_record(&record, CacheStatus::Frozen);
                reading.expires_in = Duration::ZERO;
                reading.freeze_reason = Some(err.to_string());
                Ok(reading)
            }
            None => {
                warn!(body = %body.id, error = %err, "body fetch failed with no fallback");
                Err(OrreryError::NoCachedData {
                    body: body.id.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
