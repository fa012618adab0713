//! Horizons HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::debug;

use super::parse::{parse_observer_table, parse_vector_table};
use super::EphemerisSource;
use crate::error::{OrreryError, Result};
use crate::types::{BodyDescriptor, FetchMode, StateVector};

/// Production Horizons endpoint.
pub const DEFAULT_HORIZONS_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

/// Reference frame Horizons vector tables are expressed in.
const FRAME: &str = "ICRF";

/// One-round-trip-per-body client for the Horizons API.
///
/// Vectors mode issues a single `EPHEM_TYPE=VECTORS` request; full mode
/// adds an `EPHEM_TYPE=OBSERVER` request for the observer-geometry
/// quantities and merges the two.
pub struct HorizonsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HorizonsClient {
    /// Create a client against the production endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_HORIZONS_URL)
    }

    /// Create a client against a custom endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OrreryError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Shared query parameters: current-epoch single-row ephemeris.
    fn window() -> (String, String) {
        let now = Utc::now();
        let stop = now + ChronoDuration::minutes(1);
        let fmt = "%Y-%b-%d %H:%M";
        (now.format(fmt).to_string(), stop.format(fmt).to_string())
    }

    async fn request(&self, query: &[(&str, String)]) -> Result<String> {
        let response = self.http.get(&self.base_url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(OrreryError::RateLimited { retry_after: None });
            }
            return Err(OrreryError::Api {
                status: status.as_u16(),
                message: format!("Horizons returned HTTP {status}"),
            });
        }
        Ok(response.text().await?)
    }

    async fn fetch_vectors(&self, body: &BodyDescriptor) -> Result<StateVector> {
        let (start, stop) = Self::window();
        let query = [
            ("format", "text".to_string()),
            ("COMMAND", format!("'{}'", body.horizons_id)),
            ("EPHEM_TYPE", "VECTORS".to_string()),
            ("CENTER", "'500@10'".to_string()),
            ("OBJ_DATA", "'NO'".to_string()),
            ("VEC_TABLE", "'2'".to_string()),
            ("OUT_UNITS", "'AU-D'".to_string()),
            ("START_TIME", format!("'{start}'")),
            ("STOP_TIME", format!("'{stop}'")),
            ("STEP_SIZE", "'1'".to_string()),
        ];
        let payload = self.request(&query).await?;
        let row = parse_vector_table(&payload)?;
        debug!(body = %body.id, epoch = %row.epoch, "fetched state vector");
        Ok(StateVector {
            name: body.display_name.clone(),
            x: row.x,
            y: row.y,
            z: row.z,
            vx: row.vx,
            vy: row.vy,
            vz: row.vz,
            observer: None,
            epoch: row.epoch,
        })
    }

    async fn fetch_observer(&self, body: &BodyDescriptor) -> Result<StateVector> {
        let mut vector = self.fetch_vectors(body).await?;
        let (start, stop) = Self::window();
        let query = [
            ("format", "text".to_string()),
            ("COMMAND", format!("'{}'", body.horizons_id)),
            ("EPHEM_TYPE", "OBSERVER".to_string()),
            ("CENTER", "'500@399'".to_string()),
            ("OBJ_DATA", "'NO'".to_string()),
            ("QUANTITIES", "'9,10,20,21,23,24'".to_string()),
            ("CSV_FORMAT", "'YES'".to_string()),
            ("START_TIME", format!("'{start}'")),
            ("STOP_TIME", format!("'{stop}'")),
            ("STEP_SIZE", "'1'".to_string()),
        ];
        let payload = self.request(&query).await?;
        vector.observer = Some(parse_observer_table(&payload)?);
        Ok(vector)
    }
}

#[async_trait]
impl EphemerisSource for HorizonsClient {
    fn name(&self) -> &str {
        "horizons"
    }

    async fn fetch(&self, body: &BodyDescriptor, mode: FetchMode) -> Result<StateVector> {
        match mode {
            FetchMode::Vectors => self.fetch_vectors(body).await,
            FetchMode::Full => self.fetch_observer(body).await,
        }
    }

    fn frame(&self) -> &str {
        FRAME
    }

    /// `OUT_UNITS='AU-D'`.
    fn velocity_unit(&self) -> &str {
        "au/day"
    }
}
