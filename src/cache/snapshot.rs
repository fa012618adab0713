//! Multi-body snapshot cache.
//!
//! Aggregates one state vector per tracked body into a [`Snapshot`]
//! and manages its lifecycle: TTL, a stale-while-revalidate window,
//! per-mode refresh coalescing, frozen fallbacks when the upstream is
//! down, dual-backend persistence, and a background prewarm loop.
//!
//! # Freshness policy
//!
//! - `age < ttl` — HIT, served as-is.
//! - `ttl <= age < ttl + stale_window` — STALE, served immediately;
//!   a background revalidation is kicked off unless one is already in
//!   flight, so callers never wait on the upstream while a usable copy
//!   exists.
//! - older, or no record — the caller's request performs (or joins)
//!   a synchronous refresh.
//!
//! A refresh that fails entirely degrades to the best previous record
//! from either backend, marked FROZEN; with no record anywhere the
//! failure propagates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::record::{CacheBackendKind, CachePolicy, CacheRecord, CacheStatus, Freshness};
use crate::cache::store::SnapshotStore;
use crate::error::{OrreryError, Result};
use crate::horizons::EphemerisSource;
use crate::telemetry;
use crate::types::body::BodyCatalog;
use crate::types::{FetchMode, Snapshot, StateVector};

type SharedRefresh =
    Shared<BoxFuture<'static, std::result::Result<CacheRecord<Snapshot>, Arc<OrreryError>>>>;

/// A decorated read from the snapshot cache.
#[derive(Debug, Clone)]
pub struct SnapshotReading {
    pub snapshot: Arc<Snapshot>,
    pub status: CacheStatus,
    pub backend: CacheBackendKind,
    pub age: Duration,
    pub expires_in: Duration,
    pub generated_at: DateTime<Utc>,
    /// Set when `status == Frozen`: why the live refresh failed.
    pub freeze_reason: Option<String>,
}

impl SnapshotReading {
    fn from_record(
        record: &CacheRecord<Snapshot>,
        status: CacheStatus,
        backend: CacheBackendKind,
    ) -> Self {
        Self {
            snapshot: Arc::clone(record.payload()),
            status,
            backend,
            age: record.age(),
            expires_in: record.expires_in(),
            generated_at: record.generated_at(),
            freeze_reason: None,
        }
    }
}

/// Cache of full-body-set snapshots, one slot per [`FetchMode`].
///
/// A cheap handle: clones share the underlying state, which lets
/// refresh futures and the prewarm task own a reference to it.
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    source: Arc<dyn EphemerisSource>,
    catalog: Arc<BodyCatalog>,
    policy: CachePolicy,
    store: Arc<dyn SnapshotStore>,
    inflight: Mutex<HashMap<FetchMode, SharedRefresh>>,
}

impl SnapshotCache {
    pub fn new(
        source: Arc<dyn EphemerisSource>,
        catalog: Arc<BodyCatalog>,
        policy: CachePolicy,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                catalog,
                policy,
                store,
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Get the snapshot for a mode under the freshness policy above.
    pub async fn get(&self, mode: FetchMode, force_refresh: bool) -> Result<SnapshotReading> {
        if !force_refresh {
            if let Some((record, backend)) = self.inner.store.load(mode).await {
                match record.freshness() {
                    Freshness::Fresh => {
                        metrics::counter!(telemetry::CACHE_HITS_TOTAL,
                            "cache" => "snapshot", "mode" => mode.as_str())
                        .increment(1);
                        return Ok(SnapshotReading::from_record(
                            &record,
                            CacheStatus::Hit,
                            backend,
                        ));
                    }
                    Freshness::Stale => {
                        metrics::counter!(telemetry::STALE_SERVES_TOTAL, "mode" => mode.as_str())
                            .increment(1);
                        self.revalidate_in_background(mode);
                        return Ok(SnapshotReading::from_record(
                            &record,
                            CacheStatus::Stale,
                            backend,
                        ));
                    }
                    Freshness::Expired => {}
                }
            }
        }

        let refresh = self.join_or_start_refresh(mode);
        match refresh.await {
            Ok(record) => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL,
                    "cache" => "snapshot", "mode" => mode.as_str())
                .increment(1);
                Ok(SnapshotReading::from_record(
                    &record,
                    CacheStatus::Miss,
                    CacheBackendKind::Memory,
                ))
            }
            Err(err) => self.freeze_or_propagate(mode, &err).await,
        }
    }

    /// Spawn a fire-and-forget refresh unless one is already running.
    /// Stale-serve callers are never blocked by it; its failure is
    /// logged, never thrown into a caller's path.
    fn revalidate_in_background(&self, mode: FetchMode) {
        {
            let inflight = self.inner.inflight.lock().expect("snapshot inflight poisoned");
            if inflight.contains_key(&mode) {
                return;
            }
        }
        let refresh = self.join_or_start_refresh(mode);
        tokio::spawn(async move {
            if let Err(err) = refresh.await {
                warn!(mode = mode.as_str(), error = %err, "background revalidation failed");
            }
        });
    }

    /// Join the in-flight refresh for this mode, or start one. At most
    /// one upstream refresh per mode is in flight at a time; the slot
    /// is cleared before any waiter settles.
    fn join_or_start_refresh(&self, mode: FetchMode) -> SharedRefresh {
        let mut inflight = self.inner.inflight.lock().expect("snapshot inflight poisoned");
        if let Some(pending) = inflight.get(&mode) {
            return pending.clone();
        }

        let cache = self.clone();
        let refresh = async move {
            let result = cache.refresh_snapshot(mode).await.map_err(Arc::new);
            cache
                .inner
                .inflight
                .lock()
                .expect("snapshot inflight poisoned")
                .remove(&mode);
            result
        }
        .boxed()
        .shared();
        inflight.insert(mode, refresh.clone());
        refresh
    }

    /// Fan out one fetch per tracked body and aggregate the results.
    ///
    /// Per-body failures degrade independently: the previous
    /// snapshot's value for that body when one exists (`fallback`),
    /// otherwise `missing`. Zero bodies obtained from the upstream is
    /// a whole-refresh failure, even when fallbacks exist — the caller
    /// is better served by the previous snapshot intact, marked
    /// frozen, than by a reconstruction of it.
    async fn refresh_snapshot(&self, mode: FetchMode) -> Result<CacheRecord<Snapshot>> {
        let started = Instant::now();
        let previous = self.inner.store.load(mode).await.map(|(record, _)| record);

        let mut outcomes = Vec::new();
        for body in self.inner.catalog.tracked() {
            let outcome = self.inner.source.fetch(body, mode).await;
            outcomes.push((body, outcome));
        }

        if !outcomes.iter().any(|(_, outcome)| outcome.is_ok()) {
            let reason = outcomes
                .pop()
                .and_then(|(_, outcome)| outcome.err())
                .map(|e| e.to_string())
                .unwrap_or_else(|| "tracked body set is empty".to_string());
            return Err(OrreryError::EmptySnapshot(reason));
        }

        let mut bodies: Vec<StateVector> = Vec::new();
        let mut fallback_bodies: Vec<String> = Vec::new();
        let mut missing_bodies: Vec<String> = Vec::new();

        for (body, outcome) in outcomes {
            match outcome {
                Ok(vector) => bodies.push(vector),
                Err(err) => {
                    let fallback = previous
                        .as_ref()
                        .and_then(|record| record.payload().body(&body.display_name))
                        .cloned();
                    match fallback {
                        Some(vector) => {
                            warn!(body = %body.id, error = %err,
                                "body fetch failed, using previous snapshot value");
                            metrics::counter!(telemetry::BODY_FAILURES_TOTAL,
                                "body" => body.id.clone(), "outcome" => "fallback")
                            .increment(1);
                            bodies.push(vector);
                            fallback_bodies.push(body.display_name.clone());
                        }
                        None => {
                            warn!(body = %body.id, error = %err,
                                "body fetch failed with no previous value");
                            metrics::counter!(telemetry::BODY_FAILURES_TOTAL,
                                "body" => body.id.clone(), "outcome" => "missing")
                            .increment(1);
                            missing_bodies.push(body.display_name.clone());
                        }
                    }
                }
            }
        }

        let elapsed = started.elapsed();
        let partial = !fallback_bodies.is_empty() || !missing_bodies.is_empty();
        let snapshot = Snapshot {
            bodies,
            frame: self.inner.source.frame().to_string(),
            velocity_unit: Some(self.inner.source.velocity_unit().to_string()),
            fetched_in_ms: elapsed.as_millis() as u64,
            fallback_bodies,
            missing_bodies,
            partial,
        };
        info!(
            mode = mode.as_str(),
            bodies = snapshot.bodies.len(),
            partial,
            elapsed_ms = snapshot.fetched_in_ms,
            "snapshot refreshed"
        );
        metrics::histogram!(telemetry::REFRESH_DURATION_SECONDS, "mode" => mode.as_str())
            .record(elapsed.as_secs_f64());

        let record = CacheRecord::new(snapshot, &self.inner.policy);
        self.inner.store.store(mode, &record, true).await;
        Ok(record)
    }

    async fn freeze_or_propagate(
        &self,
        mode: FetchMode,
        err: &OrreryError,
    ) -> Result<SnapshotReading> {
        match self.inner.store.load(mode).await {
            Some((record, backend)) => {
                warn!(mode = mode.as_str(), error = %err, "serving frozen snapshot");
                metrics::counter!(telemetry::FROZEN_SERVES_TOTAL,
                    "cache" => "snapshot", "mode" => mode.as_str())
                .increment(1);
                let mut reading =
                    SnapshotReading::from_record(&record, CacheStatus::Frozen, backend);
                reading.expires_in = Duration::ZERO;
                reading.freeze_reason = Some(err.to_string());
                Ok(reading)
            }
            None => {
                warn!(mode = mode.as_str(), error = %err, "snapshot refresh failed with no fallback");
                Err(err.duplicate())
            }
        }
    }

    /// Start the background prewarm loop for vectors mode.
    ///
    /// Ticks at the policy's prewarm interval and triggers a refresh
    /// unless one is already in flight. Returns `None` when caching or
    /// prewarming is disabled. The task runs detached and does not
    /// keep the process alive past the runtime.
    pub fn start_prewarm(&self) -> Option<tokio::task::JoinHandle<()>> {
        if self.inner.policy.is_disabled() || self.inner.policy.prewarm_interval.is_zero() {
            return None;
        }
        let cache = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.inner.policy.prewarm_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // the first tick completes immediately
            loop {
                ticker.tick().await;
                {
                    let inflight = cache.inner.inflight.lock().expect("snapshot inflight poisoned");
                    if inflight.contains_key(&FetchMode::Vectors) {
                        debug!("prewarm skipped, refresh already in flight");
                        continue;
                    }
                }
                let refresh = cache.join_or_start_refresh(FetchMode::Vectors);
                if let Err(err) = refresh.await {
                    warn!(error = %err, "prewarm refresh failed");
                }
            }
        }))
    }
}
