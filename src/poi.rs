//! POI candidates and Overpass JSON decoding.
//!
//! Only `elements[].id`, `.lat`, `.lon` and `.tags` are read. Elements
//! without a position (ways and relations under `out body`, or anything
//! truncated) are skipped instead of failing the whole response.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::Deserialize;

use crate::{Coordinate, Error, Result};

/// A raw POI returned by the spatial query.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiCandidate {
    /// OpenStreetMap element id, when known
    pub id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: BTreeMap<String, String>,
}

impl PoiCandidate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            id: None,
            latitude,
            longitude,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Short human label: the `amenity` tag, else `natural`, else `name`.
    pub fn label(&self) -> &str {
        ["amenity", "natural", "name"]
            .iter()
            .find_map(|key| self.tags.get(*key))
            .map(String::as_str)
            .unwrap_or("POI")
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl OverpassElement {
    fn into_candidate(self) -> Option<PoiCandidate> {
        Some(PoiCandidate {
            id: self.id,
            latitude: self.lat?,
            longitude: self.lon?,
            tags: self.tags,
        })
    }
}

/// Decode an Overpass JSON response into candidates.
///
/// Elements missing `lat` or `lon` are dropped and logged.
///
/// # Errors
///
/// [`Error::MalformedResponse`] when the body is not JSON or has no `elements` array.
pub fn parse_overpass_response(body: &[u8]) -> Result<Vec<PoiCandidate>> {
    let response: OverpassResponse =
        serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

    let total = response.elements.len();
    let mut candidates = Vec::with_capacity(total);
    for element in response.elements {
        let id = element.id;
        match element.into_candidate() {
            Some(candidate) => candidates.push(candidate),
            None => debug!("Skipping element {:?} without a position", id),
        }
    }

    let skipped = total - candidates.len();
    if skipped > 0 {
        info!("Skipped {} of {} elements without a position", skipped, total);
    }

    Ok(candidates)
}
