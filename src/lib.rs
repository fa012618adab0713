//! Orrery - caching ephemeris gateway for the JPL Horizons API
//!
//! This crate fetches per-body orbital state from the external Horizons
//! service, caches it with a tunable TTL and stale-while-revalidate
//! window, coalesces concurrent requests into a single upstream fetch,
//! and degrades gracefully (frozen or partial results) when the
//! upstream fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use orrery::{
//!     BodyCatalog, CachePolicy, FetchMode, HorizonsClient, LocalOnly, SnapshotCache,
//! };
//!
//! #[tokio::main]
//! async fn main() -> orrery::Result<()> {
//!     let catalog = Arc::new(BodyCatalog::builtin());
//!     let source = Arc::new(HorizonsClient::new()?);
//!     let cache = Arc::new(SnapshotCache::new(
//!         source,
//!         catalog,
//!         CachePolicy::new(Duration::from_secs(120)),
//!         Arc::new(LocalOnly::new()),
//!     ));
//!
//!     let reading = cache.get(FetchMode::Vectors, false).await?;
//!     println!("{} bodies, {:?}", reading.snapshot.bodies.len(), reading.status);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod horizons;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{
    BodyReading, BodyResponse, CacheBackendKind, CacheMetadata, CachePolicy, CacheRecord,
    CacheStatus, Freshness, LocalOnly, LocalWithSharedMirror, SingleBodyCache, SnapshotCache,
    SnapshotReading, SnapshotResponse, SnapshotStore, decorate_body, decorate_snapshot,
};
pub use error::{OrreryError, Result};
pub use horizons::{DEFAULT_HORIZONS_URL, EphemerisSource, HorizonsClient};
pub use types::{
    BodyCatalog, BodyCategory, BodyDescriptor, FetchMode, ObserverGeometry, Snapshot, StateVector,
};
pub use version::PKG_VERSION;
