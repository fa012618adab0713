//! Multi-body snapshots with partial-failure accounting.

use serde::{Deserialize, Serialize};

use crate::types::StateVector;

/// An ordered set of state vectors for the tracked bodies, plus the
/// aggregate facts a client needs to judge the data.
///
/// A snapshot is valid to serve — even with `partial == true` — as long
/// as at least one body is present. Building an empty snapshot is a
/// refresh failure, never a cached artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// State vectors in catalog order.
    pub bodies: Vec<StateVector>,
    /// Reference frame the positions are expressed in.
    pub frame: String,
    /// Unit of the velocity components, when velocities are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_unit: Option<String>,
    /// Wall time the upstream fan-out took, milliseconds.
    pub fetched_in_ms: u64,
    /// Bodies whose fetch failed and were substituted from the
    /// previous snapshot.
    pub fallback_bodies: Vec<String>,
    /// Bodies whose fetch failed with nothing to substitute.
    pub missing_bodies: Vec<String>,
    /// True when either failure list is non-empty.
    pub partial: bool,
}

impl Snapshot {
    /// Find a body's vector by its display name.
    pub fn body(&self, name: &str) -> Option<&StateVector> {
        self.bodies.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(name: &str) -> StateVector {
        StateVector {
            name: name.into(),
            x: 1.0,
            y: 2.0,
            z: 3.0,
            vx: None,
            vy: None,
            vz: None,
            observer: None,
            epoch: "2026-08-29T00:00:00Z".into(),
        }
    }

    #[test]
    fn lookup_by_name() {
        let snapshot = Snapshot {
            bodies: vec![vector("Mercury"), vector("Venus")],
            frame: "ICRF".into(),
            velocity_unit: None,
            fetched_in_ms: 12,
            fallback_bodies: vec![],
            missing_bodies: vec![],
            partial: false,
        };
        assert!(snapshot.body("Venus").is_some());
        assert!(snapshot.body("Pluto").is_none());
    }

    #[test]
    fn partial_accounting_serializes_camel_case() {
        let snapshot = Snapshot {
            bodies: vec![vector("Mercury")],
            frame: "ICRF".into(),
            velocity_unit: Some("au/day".into()),
            fetched_in_ms: 40,
            fallback_bodies: vec!["Venus".into()],
            missing_bodies: vec!["Mars".into()],
            partial: true,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["fallbackBodies"][0], "Venus");
        assert_eq!(json["missingBodies"][0], "Mars");
        assert_eq!(json["partial"], true);
        assert_eq!(json["velocityUnit"], "au/day");
        assert_eq!(json["fetchedInMs"], 40);
    }
}
