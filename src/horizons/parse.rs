//! Parsers for Horizons text payloads.
//!
//! Horizons answers `format=text` requests with a report whose data
//! rows sit between `$$SOE` and `$$EOE` markers. Vector tables
//! (`EPHEM_TYPE=VECTORS`, `VEC_TABLE=2`) look like:
//!
//! ```text
//! $$SOE
//! 2460916.500000000 = A.D. 2025-Aug-29 00:00:00.0000 TDB
//!  X = 1.383898740586519E+00 Y =-2.380501019244869E-02 Z =-3.441598015041903E-02
//!  VX=  8.429987354577702E-04 VY=  1.513087004287741E-02 VZ=  2.920804545681785E-04
//! $$EOE
//! ```
//!
//! Observer tables are requested in CSV form (`CSV_FORMAT=YES`,
//! `QUANTITIES='9,10,20,21,23,24'`) and parsed positionally.

use chrono::NaiveDateTime;

use crate::error::{OrreryError, Result};
use crate::types::ObserverGeometry;

/// Position and optional velocity extracted from a vector table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VectorRow {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub vz: Option<f64>,
    /// Epoch of the first data row, ISO-8601 UTC.
    pub epoch: String,
}

/// Extract the lines between `$$SOE` and `$$EOE`.
fn data_block(payload: &str) -> Result<Vec<&str>> {
    let start = payload
        .find("$$SOE")
        .ok_or_else(|| OrreryError::Parse("missing $$SOE marker".into()))?;
    let end = payload
        .find("$$EOE")
        .ok_or_else(|| OrreryError::Parse("missing $$EOE marker".into()))?;
    if end <= start {
        return Err(OrreryError::Parse("$$EOE precedes $$SOE".into()));
    }
    Ok(payload[start + 5..end]
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect())
}

/// Pull `LABEL = value` pairs out of a vector-table line.
///
/// Horizons glues signs to the `=` (`Y =-2.38E-02`), so the line is
/// re-tokenized around `=` before pairing labels with values.
fn components(line: &str) -> Vec<(String, f64)> {
    let normalized = line.replace('=', " = ");
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i + 2 < tokens.len() {
        if tokens[i + 1] == "=" {
            if let Ok(value) = tokens[i + 2].parse::<f64>() {
                out.push((tokens[i].to_ascii_uppercase(), value));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    out
}

/// Convert a Horizons calendar epoch (`A.D. 2025-Aug-29 00:00:00.0000`)
/// to ISO-8601 UTC. TDB-vs-UTC skew (~69s) is ignored; the epoch is
/// informational, not used in cache math.
fn parse_epoch(line: &str) -> Option<String> {
    let after = line.split("A.D.").nth(1)?.trim();
    let calendar = after.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
    let parsed = NaiveDateTime::parse_from_str(&calendar, "%Y-%b-%d %H:%M:%S%.f").ok()?;
    Some(format!("{}Z", parsed.format("%Y-%m-%dT%H:%M:%S")))
}

/// Parse the first data row of a vector table.
pub(crate) fn parse_vector_table(payload: &str) -> Result<VectorRow> {
    let lines = data_block(payload)?;
    let mut epoch = None;
    let mut fields: std::collections::HashMap<String, f64> = std::collections::HashMap::new();

    for line in &lines {
        if line.contains("A.D.") {
            if epoch.is_some() {
                break; // only the first data row matters
            }
            epoch = parse_epoch(line);
            continue;
        }
        for (label, value) in components(line) {
            fields.entry(label).or_insert(value);
        }
    }

    let get = |label: &str| fields.get(label).copied();
    let (x, y, z) = match (get("X"), get("Y"), get("Z")) {
        (Some(x), Some(y), Some(z)) => (x, y, z),
        _ => return Err(OrreryError::Parse("vector table missing X/Y/Z".into())),
    };

    Ok(VectorRow {
        x,
        y,
        z,
        vx: get("VX"),
        vy: get("VY"),
        vz: get("VZ"),
        epoch: epoch.ok_or_else(|| OrreryError::Parse("vector table missing epoch".into()))?,
    })
}

/// Parse the first data row of a CSV observer table.
///
/// Column layout for `QUANTITIES='9,10,20,21,23,24'`:
/// date, sun-flag, moon-flag, APmag, S-brt, Illu%, delta, deldot,
/// 1-way_LT (minutes), S-O-T, /r, S-T-O.
pub(crate) fn parse_observer_table(payload: &str) -> Result<ObserverGeometry> {
    let lines = data_block(payload)?;
    let row = lines
        .first()
        .ok_or_else(|| OrreryError::Parse("observer table has no data rows".into()))?;
    let cols: Vec<&str> = row.split(',').map(str::trim).collect();
    if cols.len() < 12 {
        return Err(OrreryError::Parse(format!(
            "observer row has {} columns, expected at least 12",
            cols.len()
        )));
    }

    let num = |idx: usize, what: &str| -> Result<f64> {
        cols[idx]
            .parse::<f64>()
            .map_err(|_| OrreryError::Parse(format!("unparseable {what}: '{}'", cols[idx])))
    };

    Ok(ObserverGeometry {
        // "n.a." is normal for some targets (e.g. no magnitude model)
        apparent_magnitude: cols[3].parse::<f64>().ok(),
        illumination_pct: num(5, "illumination")?,
        range_au: num(6, "observer range")?,
        range_rate_km_s: num(7, "range rate")?,
        light_time_min: num(8, "light time")?,
        elongation_deg: num(9, "elongation")?,
        phase_angle_deg: num(11, "phase angle")?,
    })
}
