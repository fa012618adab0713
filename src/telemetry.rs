//! Telemetry metric name constants.
//!
//! Centralised metric names for orrery operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `orrery_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `cache` — which cache observed the event: "snapshot" or "body"
//! - `mode` — fetch mode key: "vectors" or "full"
//! - `body` — stable body identifier (e.g. "mars")

/// Total cache hits.
///
/// Labels: `cache`, `mode`.
pub const CACHE_HITS_TOTAL: &str = "orrery_cache_hits_total";

/// Total cache misses (synchronous refreshes taken).
///
/// Labels: `cache`, `mode`.
pub const CACHE_MISSES_TOTAL: &str = "orrery_cache_misses_total";

/// Total stale-while-revalidate serves.
///
/// Labels: `mode`.
pub const STALE_SERVES_TOTAL: &str = "orrery_stale_serves_total";

/// Total frozen-fallback serves (refresh failed, old data returned).
///
/// Labels: `cache`, `mode`.
pub const FROZEN_SERVES_TOTAL: &str = "orrery_frozen_serves_total";

/// Total per-body upstream fetch failures during a snapshot fan-out.
///
/// Labels: `body`, `outcome` ("fallback" | "missing").
pub const BODY_FAILURES_TOTAL: &str = "orrery_body_failures_total";

/// Snapshot refresh duration in seconds, successful refreshes only.
///
/// Labels: `mode`.
pub const REFRESH_DURATION_SECONDS: &str = "orrery_refresh_duration_seconds";
