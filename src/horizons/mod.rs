//! Upstream ephemeris source — the JPL Horizons API.
//!
//! The caches depend on upstream data only through [`EphemerisSource`]:
//! given a catalog entry, asynchronously return one normalized
//! [`StateVector`] or fail. [`HorizonsClient`] is the production
//! implementation; tests substitute mocks at the same seam.

mod client;
mod parse;

pub use client::{DEFAULT_HORIZONS_URL, HorizonsClient};

use async_trait::async_trait;

use crate::Result;
use crate::types::{BodyDescriptor, FetchMode, StateVector};

/// Asynchronous contract the caches require from the upstream.
///
/// Implementations self-report failure through the error taxonomy; the
/// caches decide what degradation (fallback, frozen serve, propagate)
/// each failure gets.
#[async_trait]
pub trait EphemerisSource: Send + Sync {
    /// Source name for logging and metric labels.
    fn name(&self) -> &str;

    /// Fetch one body's state vector in the given mode.
    async fn fetch(&self, body: &BodyDescriptor, mode: FetchMode) -> Result<StateVector>;

    /// Reference frame vectors from this source are expressed in.
    fn frame(&self) -> &str {
        "ICRF"
    }

    /// Unit of the velocity components this source reports.
    fn velocity_unit(&self) -> &str {
        "au/day"
    }
}
