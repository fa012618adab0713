//! Caching subsystem.
//!
//! Two caches with the same policy shape at different granularity:
//!
//! - [`SingleBodyCache`] — one record per catalog body, fetched in
//!   full mode. Serves `/body/{id}`. Request coalescing and frozen
//!   fallback, no stale window and no prewarm loop.
//!
//! - [`SnapshotCache`] — one record per [`FetchMode`](crate::types::FetchMode)
//!   for the whole tracked body set, with a stale-while-revalidate
//!   window, per-body fallback accounting, dual-backend storage
//!   ([`store`]) and background prewarming. Serves `/planets*`.
//!
//! Both are constructed once at startup, owned by the application
//! context, and live for the process lifetime. Cache state is mutated
//! only between await points, by whole-record replacement.

pub mod body;
pub mod decorate;
pub mod record;
pub mod snapshot;
pub mod store;

pub use body::{BodyReading, SingleBodyCache};
pub use decorate::{BodyResponse, CacheMetadata, SnapshotResponse, decorate_body, decorate_snapshot};
pub use record::{CacheBackendKind, CachePolicy, CacheRecord, CacheStatus, Freshness};
pub use snapshot::{SnapshotCache, SnapshotReading};
pub use store::{LocalOnly, LocalWithSharedMirror, SnapshotStore};
