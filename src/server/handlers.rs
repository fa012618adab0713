//! Request handlers and response assembly.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::cache::{CacheMetadata, decorate_body, decorate_snapshot};
use crate::error::OrreryError;
use crate::types::FetchMode;

use super::AppContext;

const CACHE_HEADER: HeaderName = HeaderName::from_static("x-horizons-cache");
const BACKEND_HEADER: HeaderName = HeaderName::from_static("x-horizons-cache-backend");
const AGE_HEADER: HeaderName = HeaderName::from_static("x-horizons-cache-age");
const TTL_HEADER: HeaderName = HeaderName::from_static("x-horizons-ttl");
const STALE_HEADER: HeaderName = HeaderName::from_static("x-horizons-cache-stale");
const FROZEN_HEADER: HeaderName = HeaderName::from_static("x-horizons-frozen");
const LATENCY_HEADER: HeaderName = HeaderName::from_static("x-horizons-latency");
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const REFRESH_HEADER: HeaderName = HeaderName::from_static("x-refresh-cache");

#[derive(Debug, Deserialize)]
pub(super) struct EphemerisQuery {
    refresh: Option<String>,
}

/// `?refresh=1|true` or `X-Refresh-Cache: 1|true` forces a synchronous
/// refresh, bypassing the HIT/STALE short-circuit.
fn wants_refresh(query: &EphemerisQuery, headers: &HeaderMap) -> bool {
    let truthy = |v: &str| v == "1" || v.eq_ignore_ascii_case("true");
    if query.refresh.as_deref().is_some_and(truthy) {
        return true;
    }
    headers
        .get(&REFRESH_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(truthy)
}

/// Mirror the metadata block into response headers.
fn cache_headers(metadata: &CacheMetadata) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let set = |headers: &mut HeaderMap, name: HeaderName, value: String| {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    };
    set(&mut headers, CACHE_HEADER, metadata.cache_status.as_str().to_string());
    set(&mut headers, BACKEND_HEADER, metadata.cache_backend.as_str().to_string());
    set(&mut headers, AGE_HEADER, metadata.cache_age_ms.to_string());
    set(&mut headers, TTL_HEADER, metadata.cache_ttl_ms.to_string());
    set(&mut headers, STALE_HEADER, u8::from(metadata.stale).to_string());
    set(&mut headers, FROZEN_HEADER, u8::from(metadata.frozen_snapshot).to_string());
    set(&mut headers, REQUEST_ID_HEADER, metadata.request_id.clone());
    if let Some(latency) = metadata.latency_ms {
        set(&mut headers, LATENCY_HEADER, latency.to_string());
    }
    headers
}

/// Map core failures to client responses.
fn error_response(err: &OrreryError, request_id: &str) -> Response {
    let status = match err {
        OrreryError::UnknownBody(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    let body = Json(json!({
        "error": err.to_string(),
        "requestId": request_id,
    }));
    (status, headers, body).into_response()
}

async fn snapshot_response(
    context: Arc<AppContext>,
    mode: FetchMode,
    query: EphemerisQuery,
    headers: HeaderMap,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let force = wants_refresh(&query, &headers);
    match context.snapshot_cache.get(mode, force).await {
        Ok(reading) => {
            let response =
                decorate_snapshot(&reading, context.snapshot_cache.policy(), &request_id);
            (cache_headers(&response.metadata), Json(response)).into_response()
        }
        Err(err) => error_response(&err, &request_id),
    }
}

pub(super) async fn planets_vectors(
    State(context): State<Arc<AppContext>>,
    Query(query): Query<EphemerisQuery>,
    headers: HeaderMap,
) -> Response {
    snapshot_response(context, FetchMode::Vectors, query, headers).await
}

pub(super) async fn planets_full(
    State(context): State<Arc<AppContext>>,
    Query(query): Query<EphemerisQuery>,
    headers: HeaderMap,
) -> Response {
    snapshot_response(context, FetchMode::Full, query, headers).await
}

pub(super) async fn body(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Query(query): Query<EphemerisQuery>,
    headers: HeaderMap,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let Some(descriptor) = context.catalog.get(&id) else {
        return error_response(&OrreryError::UnknownBody(id), &request_id);
    };
    let force = wants_refresh(&query, &headers);
    match context.body_cache.get(descriptor, force).await {
        Ok(reading) => {
            let response = decorate_body(&reading, context.body_cache.policy(), &request_id);
            (cache_headers(&response.metadata), Json(response)).into_response()
        }
        Err(err) => error_response(&err, &request_id),
    }
}

pub(super) async fn ping() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}
