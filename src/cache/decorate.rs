//! Response decoration.
//!
//! Pure functions that turn cache readings into outgoing payloads.
//! The cached copy is never touched: envelopes clone the payload and
//! attach a [`CacheMetadata`] block mirroring the `X-Horizons-*`
//! headers for clients that cannot read headers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::body::BodyReading;
use crate::cache::record::{CacheBackendKind, CachePolicy, CacheStatus};
use crate::cache::snapshot::SnapshotReading;
use crate::types::{Snapshot, StateVector};

/// Cache-observability facts attached to every outgoing payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub cache_status: CacheStatus,
    pub cache_backend: CacheBackendKind,
    pub cache_age_ms: u64,
    pub cache_expires_in_ms: u64,
    pub cache_ttl_ms: u64,
    pub stale: bool,
    pub frozen_snapshot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeze_reason: Option<String>,
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    /// Upstream fan-out latency, when this payload was fetched live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Multi-body response envelope: the snapshot fields plus `metadata`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub metadata: CacheMetadata,
}

/// Single-body response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyResponse {
    #[serde(flatten)]
    pub body: StateVector,
    pub metadata: CacheMetadata,
}

/// Decorate a snapshot reading for a caller.
pub fn decorate_snapshot(
    reading: &SnapshotReading,
    policy: &CachePolicy,
    request_id: &str,
) -> SnapshotResponse {
    let snapshot = reading.snapshot.as_ref().clone();
    let latency_ms = Some(snapshot.fetched_in_ms);
    SnapshotResponse {
        metadata: CacheMetadata {
            cache_status: reading.status,
            cache_backend: reading.backend,
            cache_age_ms: reading.age.as_millis() as u64,
            cache_expires_in_ms: reading.expires_in.as_millis() as u64,
            cache_ttl_ms: policy.ttl.as_millis() as u64,
            stale: reading.status == CacheStatus::Stale,
            frozen_snapshot: reading.status == CacheStatus::Frozen,
            freeze_reason: reading.freeze_reason.clone(),
            request_id: request_id.to_string(),
            generated_at: reading.generated_at,
            latency_ms,
        },
        snapshot,
    }
}

/// Decorate a single-body reading for a caller.
pub fn decorate_body(
    reading: &BodyReading,
    policy: &CachePolicy,
    request_id: &str,
) -> BodyResponse {
    BodyResponse {
        body: reading.vector.as_ref().clone(),
        metadata: CacheMetadata {
            cache_status: reading.status,
            cache_backend: CacheBackendKind::Memory,
            cache_age_ms: reading.age.as_millis() as u64,
            cache_expires_in_ms: reading.expires_in.as_millis() as u64,
            cache_ttl_ms: policy.ttl.as_millis() as u64,
            stale: reading.status == CacheStatus::Stale,
            frozen_snapshot: reading.status == CacheStatus::Frozen,
            freeze_reason: reading.freeze_reason.clone(),
            request_id: request_id.to_string(),
            generated_at: reading.generated_at,
            latency_ms: None,
        },
    }
}
