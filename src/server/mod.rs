//! HTTP surface for the ephemeris gateway.
//!
//! Thin axum layer over the caches: routes, the force-refresh escape
//! hatch (`?refresh=1` / `X-Refresh-Cache: 1`), `X-Horizons-*` cache
//! headers on every ephemeris response, and the error mapping (404 for
//! unknown bodies, 500 JSON when nothing degradable exists).

pub mod config;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{SingleBodyCache, SnapshotCache};
use crate::types::BodyCatalog;

/// Process-wide application context handed to every request handler.
///
/// Constructed once at startup; the caches it owns live for the
/// process lifetime.
pub struct AppContext {
    pub snapshot_cache: Arc<SnapshotCache>,
    pub body_cache: Arc<SingleBodyCache>,
    pub catalog: Arc<BodyCatalog>,
}

/// Build the gateway router.
pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/planets", get(handlers::planets_vectors))
        .route("/planets/state-vectors", get(handlers::planets_vectors))
        .route("/planets/full", get(handlers::planets_full))
        .route("/body/:id", get(handlers::body))
        .route("/health/ping", get(handlers::ping))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(context)
}
