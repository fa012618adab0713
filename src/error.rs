//! Orrery error types

use std::time::Duration;

/// Orrery error types
#[derive(Debug, thiserror::Error)]
pub enum OrreryError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Horizons API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited by upstream, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The upstream returned a payload we could not extract a state
    /// vector from (missing `$$SOE` block, unparseable numbers, ...).
    #[error("unparseable ephemeris payload: {0}")]
    Parse(String),

    // Cache errors
    /// A refresh produced zero bodies. A snapshot with no bodies is
    /// never a valid cached artifact; callers fall back or propagate.
    #[error("snapshot refresh yielded no bodies: {0}")]
    EmptySnapshot(String),

    /// Fetch failed and no previous record exists to degrade to.
    #[error("no cached data for '{body}': {reason}")]
    NoCachedData { body: String, reason: String },

    // Client input errors
    #[error("unknown body: {0}")]
    UnknownBody(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl OrreryError {
    /// Rebuild an equivalent owned error from one shared between
    /// coalesced waiters (the source error is behind an `Arc`).
    pub(crate) fn duplicate(&self) -> OrreryError {
        use OrreryError::*;
        match self {
            Http(s) => Http(s.clone()),
            Api { status, message } => Api {
                status: *status,
                message: message.clone(),
            },
            RateLimited { retry_after } => RateLimited {
                retry_after: *retry_after,
            },
            Parse(s) => Parse(s.clone()),
            EmptySnapshot(s) => EmptySnapshot(s.clone()),
            NoCachedData { body, reason } => NoCachedData {
                body: body.clone(),
                reason: reason.clone(),
            },
            UnknownBody(s) => UnknownBody(s.clone()),
            // serde_json::Error is not Clone; preserve the message
            Json(e) => Parse(e.to_string()),
            Configuration(s) => Configuration(s.clone()),
        }
    }
}

impl From<reqwest::Error> for OrreryError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                return OrreryError::RateLimited { retry_after: None };
            }
            return OrreryError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        OrreryError::Http(err.to_string())
    }
}

/// Result type alias for Orrery operations
pub type Result<T> = std::result::Result<T, OrreryError>;
