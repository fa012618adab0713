//! Static body catalog.
//!
//! Maps stable body identifiers (`"mars"`) to Horizons command ids
//! (`"499"`) and display metadata. Loaded once at startup and never
//! mutated; every cache keys off the stable identifier.

use serde::{Deserialize, Serialize};

/// Coarse classification of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyCategory {
    Star,
    Planet,
    Moon,
    Probe,
}

/// One entry in the body catalog. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    /// Stable identifier used in URLs and cache keys (e.g. `"mars"`).
    pub id: String,
    /// Horizons `COMMAND` id (e.g. `"499"` for Mars).
    pub horizons_id: String,
    /// Human-readable display name.
    pub display_name: String,
    pub category: BodyCategory,
}

impl BodyDescriptor {
    fn new(id: &str, horizons_id: &str, display_name: &str, category: BodyCategory) -> Self {
        Self {
            id: id.to_string(),
            horizons_id: horizons_id.to_string(),
            display_name: display_name.to_string(),
            category,
        }
    }
}

/// The full set of bodies this process knows about.
///
/// The *tracked set* (what a multi-body snapshot contains) is the
/// planets; the star and moons are reachable through the single-body
/// path only.
#[derive(Debug, Clone)]
pub struct BodyCatalog {
    entries: Vec<BodyDescriptor>,
}

impl BodyCatalog {
    /// The built-in solar-system catalog.
    pub fn builtin() -> Self {
        use BodyCategory::{Moon, Planet, Star};
        Self {
            entries: vec![
                BodyDescriptor::new("sun", "10", "Sun", Star),
                BodyDescriptor::new("mercury", "199", "Mercury", Planet),
                BodyDescriptor::new("venus", "299", "Venus", Planet),
                BodyDescriptor::new("earth", "399", "Earth", Planet),
                BodyDescriptor::new("mars", "499", "Mars", Planet),
                BodyDescriptor::new("jupiter", "599", "Jupiter", Planet),
                BodyDescriptor::new("saturn", "699", "Saturn", Planet),
                BodyDescriptor::new("uranus", "799", "Uranus", Planet),
                BodyDescriptor::new("neptune", "899", "Neptune", Planet),
                BodyDescriptor::new("moon", "301", "Moon", Moon),
            ],
        }
    }

    /// Build a catalog from explicit entries (configuration or tests).
    pub fn from_entries(entries: Vec<BodyDescriptor>) -> Self {
        Self { entries }
    }

    /// Look up a body by its stable identifier.
    pub fn get(&self, id: &str) -> Option<&BodyDescriptor> {
        self.entries.iter().find(|b| b.id == id)
    }

    /// The tracked multi-body set, in catalog order.
    pub fn tracked(&self) -> impl Iterator<Item = &BodyDescriptor> {
        self.entries
            .iter()
            .filter(|b| b.category == BodyCategory::Planet)
    }

    /// All catalog entries, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &BodyDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_eight_tracked_planets() {
        let catalog = BodyCatalog::builtin();
        assert_eq!(catalog.tracked().count(), 8);
    }

    #[test]
    fn lookup_by_stable_id() {
        let catalog = BodyCatalog::builtin();
        let mars = catalog.get("mars").unwrap();
        assert_eq!(mars.horizons_id, "499");
        assert_eq!(mars.display_name, "Mars");
        assert_eq!(mars.category, BodyCategory::Planet);
    }

    #[test]
    fn unknown_id_returns_none() {
        let catalog = BodyCatalog::builtin();
        assert!(catalog.get("vulcan").is_none());
    }

    #[test]
    fn star_and_moon_are_not_tracked() {
        let catalog = BodyCatalog::builtin();
        assert!(catalog.tracked().all(|b| b.category == BodyCategory::Planet));
        assert!(catalog.get("sun").is_some());
        assert!(catalog.get("moon").is_some());
    }

    #[test]
    fn tracked_set_preserves_catalog_order() {
        let catalog = BodyCatalog::builtin();
        let ids: Vec<&str> = catalog.tracked().map(|b| b.id.as_str()).collect();
        assert_eq!(ids[0], "mercury");
        assert_eq!(ids[7], "neptune");
    }
}
