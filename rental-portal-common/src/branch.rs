use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Longitude/latitude pair. Travels as a GeoJSON `[longitude, latitude]` array.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.longitude, value.latitude]
    }
}

/// GeoJSON geometry kind. Branches are always single points.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoKind {
    #[default]
    Point,
}

/// GeoJSON point locating a [Branch]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    #[serde(rename = "type", default)]
    pub kind: GeoKind,
    pub coordinates: Coordinates,
}

impl GeoPoint {
    pub const fn new(coordinates: Coordinates) -> Self {
        Self {
            kind: GeoKind::Point,
            coordinates,
        }
    }
}

/// Physical rental location used for pickup and return
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub location: GeoPoint,
}

/// Create and update body for a [Branch]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BranchData {
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub location: GeoPoint,
}

impl From<&Branch> for BranchData {
    fn from(value: &Branch) -> Self {
        Self {
            name: value.name.clone(),
            address: value.address.clone(),
            city: value.city.clone(),
            country: value.country.clone(),
            location: value.location,
        }
    }
}

/// Branch counts shown on the dashboard. Computed locally from the branch list since the backend
/// has no statistics endpoint for branches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BranchStats {
    pub total_branches: usize,
    pub active_branches: usize,
    pub branches_by_country: BTreeMap<String, usize>,
    pub branches_by_city: BTreeMap<String, usize>,
}

impl BranchStats {
    /// Tally the `branches` by country and city. Every branch counts as active.
    pub fn from_branches(branches: &[Branch]) -> Self {
        let mut stats = Self {
            total_branches: branches.len(),
            active_branches: branches.len(),
            ..Self::default()
        };
        for branch in branches {
            *stats
                .branches_by_country
                .entry(branch.country.clone())
                .or_default() += 1;
            *stats.branches_by_city.entry(branch.city.clone()).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{Branch, BranchStats, Coordinates};

    fn branch(id: &str, city: &str, country: &str) -> Branch {
        serde_json::from_value(json!({
            "_id": id,
            "name": format!("{city} Central"),
            "address": "1 Main St",
            "city": city,
            "country": country,
            "location": {"type": "Point", "coordinates": [1.5, 2.5]}
        }))
        .expect("Failed to deserialize branch")
    }

    #[test]
    fn location_should_read_longitude_first() {
        let branch = branch("b1", "Paris", "France");

        assert_eq!(branch.location.coordinates, Coordinates::new(1.5, 2.5));
    }

    #[test]
    fn location_should_serialize_as_geojson() {
        let branch = branch("b1", "Paris", "France");

        let value = serde_json::to_value(branch.location).expect("Failed to serialize");

        assert_eq!(value, json!({"type": "Point", "coordinates": [1.5, 2.5]}));
    }

    #[test]
    fn stats_should_group_by_country_and_city() {
        let branches = vec![
            branch("b1", "Paris", "France"),
            branch("b2", "Lyon", "France"),
            branch("b3", "Paris", "France"),
            branch("b4", "Tokyo", "Japan"),
        ];

        let stats = BranchStats::from_branches(&branches);

        assert_eq!(stats.total_branches, 4);
        assert_eq!(stats.active_branches, 4);
        assert_eq!(stats.branches_by_country.get("France"), Some(&3));
        assert_eq!(stats.branches_by_city.get("Paris"), Some(&2));
        assert_eq!(stats.branches_by_city.get("Tokyo"), Some(&1));
    }
}
