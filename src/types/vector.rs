//! State vectors and fetch modes.

use serde::{Deserialize, Serialize};

/// Which fields an upstream fetch requests.
///
/// Modes are stored under distinct cache keys: a full-mode snapshot
/// carries observer geometry a vectors-only snapshot lacks, so the two
/// are fetched and expired independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Position + velocity only.
    Vectors,
    /// Position + velocity + observer geometry.
    Full,
}

impl FetchMode {
    /// Stable key string, used for cache partitioning and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Vectors => "vectors",
            FetchMode::Full => "full",
        }
    }
}

/// Earth-observer geometry, present only in [`FetchMode::Full`] fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverGeometry {
    /// Observer range in AU.
    pub range_au: f64,
    /// Range rate in km/s (positive = receding).
    pub range_rate_km_s: f64,
    /// One-way light time in minutes.
    pub light_time_min: f64,
    /// Solar elongation in degrees.
    pub elongation_deg: f64,
    /// Sun-target-observer phase angle in degrees.
    pub phase_angle_deg: f64,
    /// Illuminated fraction of the disk, percent.
    pub illumination_pct: f64,
    /// Apparent visual magnitude, when the upstream reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_magnitude: Option<f64>,
}

/// The normalized result of one upstream fetch. Never mutated after
/// construction; derived payloads copy-and-extend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVector {
    /// Display name of the body.
    pub name: String,
    /// Heliocentric position in AU.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Velocity components, when the upstream reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vz: Option<f64>,
    /// Observer geometry, full mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observer: Option<ObserverGeometry>,
    /// Epoch of validity, ISO-8601.
    pub epoch: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vector() -> StateVector {
        StateVector {
            name: "Mars".into(),
            x: 1.38,
            y: -0.02,
            z: -0.03,
            vx: Some(0.001),
            vy: Some(0.015),
            vz: Some(0.0003),
            observer: None,
            epoch: "2026-08-29T00:00:00Z".into(),
        }
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_observer() {
        let json = serde_json::to_value(sample_vector()).unwrap();
        assert_eq!(json["name"], "Mars");
        assert!(json.get("observer").is_none());
        assert_eq!(json["epoch"], "2026-08-29T00:00:00Z");
    }

    #[test]
    fn observer_geometry_round_trips() {
        let mut vector = sample_vector();
        vector.observer = Some(ObserverGeometry {
            range_au: 2.1,
            range_rate_km_s: 11.4,
            light_time_min: 17.5,
            elongation_deg: 44.0,
            phase_angle_deg: 25.3,
            illumination_pct: 95.2,
            apparent_magnitude: Some(1.2),
        });
        let json = serde_json::to_string(&vector).unwrap();
        let back: StateVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vector);
        assert!(json.contains("rangeAu"));
        assert!(json.contains("lightTimeMin"));
    }

    #[test]
    fn mode_key_strings_are_distinct() {
        assert_ne!(FetchMode::Vectors.as_str(), FetchMode::Full.as_str());
    }
}
