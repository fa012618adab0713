//! Core data types shared across the crate.

pub mod body;
pub mod snapshot;
pub mod vector;

pub use body::{BodyCatalog, BodyCategory, BodyDescriptor};
pub use snapshot::Snapshot;
pub use vector::{FetchMode, ObserverGeometry, StateVector};
