//! Overpass QL query construction for tag-based POI categories.
//!
//! A [`PoiCategory`] is an OpenStreetMap tag filter (`amenity=drinking_water`,
//! `natural=spring`, or a bare key). [`build_query`] turns a list of them and a
//! [`BoundingBox`] into one union query:
//!
//! ```text
//! [out:json][timeout:25];
//! (
//!   node["amenity"="drinking_water"](45.1,5.7,45.2,5.8);
//!   node["natural"="spring"](45.1,5.7,45.2,5.8);
//! );
//! out body;
//! ```
//!
//! See <https://wiki.openstreetmap.org/wiki/Map_features> for the tag vocabulary.

use std::fmt;

use crate::BoundingBox;

/// Server-side execution budget requested from Overpass, in seconds.
pub const QUERY_TIMEOUT_SECS: u32 = 25;

/// A tag filter: key plus optional value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoiCategory {
    pub key: String,
    pub value: Option<String>,
}

impl PoiCategory {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self { key: key.into(), value }
    }

    /// Match any node carrying `key`, whatever its value.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }

    /// `amenity=<value>`, see <https://wiki.openstreetmap.org/wiki/Key:amenity>
    pub fn amenity(value: impl Into<String>) -> Self {
        Self::new("amenity", Some(value.into()))
    }

    /// `natural=<value>`, see <https://wiki.openstreetmap.org/wiki/Key:natural>
    pub fn natural(value: impl Into<String>) -> Self {
        Self::new("natural", Some(value.into()))
    }

    /// Overpass clause selecting nodes of this category inside `bbox`.
    pub fn query_line(&self, bbox: &BoundingBox) -> String {
        format!("node[{}]({});", self, BboxFilter(bbox))
    }
}

impl fmt::Display for PoiCategory {
    /// Tag filter body, e.g. `"amenity"="drinking_water"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape(&self.key))?;
        if let Some(value) = &self.value {
            write!(f, "=\"{}\"", escape(value))?;
        }
        Ok(())
    }
}

/// Overpass bbox filter order: south,west,north,east.
struct BboxFilter<'a>(&'a BoundingBox);

impl fmt::Display for BboxFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(f, "{},{},{},{}", b.south, b.west, b.north, b.east)
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build an Overpass union query for `categories` inside `bbox`.
///
/// Clause order follows `categories`. The output only depends on the inputs,
/// so the same categories and box always give byte-identical text.
///
/// # Example
/// ```
/// use thirsty::{build_query, BoundingBox, PoiCategory};
///
/// let bbox = BoundingBox { south: 1.0, west: 2.0, north: 3.0, east: 4.0 };
/// let query = build_query(&[PoiCategory::amenity("drinking_water")], &bbox);
/// assert_eq!(
///     query,
///     "[out:json][timeout:25];\n(\n  node[\"amenity\"=\"drinking_water\"](1,2,3,4);\n);\nout body;"
/// );
/// ```
pub fn build_query(categories: &[PoiCategory], bbox: &BoundingBox) -> String {
    let mut lines = Vec::with_capacity(categories.len() + 4);
    lines.push(format!("[out:json][timeout:{}];", QUERY_TIMEOUT_SECS));
    lines.push("(".to_string());
    lines.extend(categories.iter().map(|c| format!("  {}", c.query_line(bbox))));
    lines.push(");".to_string());
    lines.push("out body;".to_string());
    lines.join("\n")
}

/// A named set of categories plus how matching POIs are labelled as waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiKind {
    pub categories: Vec<PoiCategory>,
    /// Waypoint name and description
    pub label: String,
    /// Waypoint symbol (GPX `<sym>`)
    pub symbol: String,
}

impl PoiKind {
    pub fn new(categories: Vec<PoiCategory>, label: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            categories,
            label: label.into(),
            symbol: symbol.into(),
        }
    }

    /// Drinking water taps, fountains and springs.
    pub fn drinking_water() -> Self {
        Self::new(
            vec![PoiCategory::amenity("drinking_water"), PoiCategory::natural("spring")],
            "Water",
            "water-drop",
        )
    }

    /// Anywhere to get a drink or a snack.
    pub fn snacks_and_drinks() -> Self {
        let amenities = [
            "drinking_water",
            "restaurant",
            "milk_dispenser",
            "pub",
            "shop",
            "kiosk",
            "juice_bar",
            "fuel",
        ];
        let categories = amenities
            .into_iter()
            .map(PoiCategory::amenity)
            .chain(std::iter::once(PoiCategory::natural("spring")))
            .collect();
        Self::new(categories, "Food", "restaurant")
    }

    /// Query for this kind inside `bbox`.
    pub fn query(&self, bbox: &BoundingBox) -> String {
        build_query(&self.categories, bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox { south: 45.1, west: 5.7, north: 45.25, east: 5.8 }
    }

    #[test]
    fn test_category_display() {
        assert_eq!(PoiCategory::amenity("drinking_water").to_string(), r#""amenity"="drinking_water""#);
        assert_eq!(PoiCategory::key("shop").to_string(), r#""shop""#);
    }

    #[test]
    fn test_query_line_presence_only() {
        let line = PoiCategory::key("drinking_water").query_line(&bbox());
        assert_eq!(line, r#"node["drinking_water"](45.1,5.7,45.25,5.8);"#);
    }

    #[test]
    fn test_water_query() {
        let query = PoiKind::drinking_water().query(&bbox());
        let expected = [
            "[out:json][timeout:25];",
            "(",
            r#"  node["amenity"="drinking_water"](45.1,5.7,45.25,5.8);"#,
            r#"  node["natural"="spring"](45.1,5.7,45.25,5.8);"#,
            ");",
            "out body;",
        ]
        .join("\n");
        assert_eq!(query, expected);
    }

    #[test]
    fn test_clause_order_follows_input() {
        let categories = vec![PoiCategory::natural("spring"), PoiCategory::amenity("pub")];
        let query = build_query(&categories, &bbox());
        let spring = query.find("spring").unwrap();
        let pub_pos = query.find("pub").unwrap();
        assert!(spring < pub_pos);
    }

    #[test]
    fn test_query_is_deterministic() {
        let kind = PoiKind::snacks_and_drinks();
        assert_eq!(kind.query(&bbox()), kind.query(&bbox()));
        assert_eq!(kind.query(&bbox()).matches("node[").count(), 9);
    }

    #[test]
    fn test_empty_category_list() {
        let query = build_query(&[], &bbox());
        assert_eq!(query, "[out:json][timeout:25];\n(\n);\nout body;");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let category = PoiCategory::new("name", Some(r#"Bob's "best" \ tap"#.to_string()));
        assert_eq!(category.to_string(), r#""name"="Bob's \"best\" \\ tap""#);
    }
}
