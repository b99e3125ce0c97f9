//! Interactive HTML map of a track and its POIs.
//!
//! The page is a single self-contained HTML file loading Leaflet and
//! OpenStreetMap tiles from public CDNs. The renderer only sees a
//! [`MapView`]: coordinate sequences and labelled markers.

use std::fmt::Write;

use crate::geo_utils::compute_center;
use crate::{Coordinate, PoiCandidate, Track};

const LEAFLET_VERSION: &str = "1.9.4";
const DEFAULT_ZOOM: u8 = 12;

/// A labelled POI marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub coordinate: Coordinate,
    pub label: String,
}

/// What the map renderer gets to see of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// One polyline per track segment
    pub polylines: Vec<Vec<Coordinate>>,
    pub markers: Vec<MapMarker>,
    /// Mean of all track coordinates
    pub center: Coordinate,
}

impl MapView {
    pub fn new(track: &Track, pois: &[PoiCandidate]) -> Self {
        let polylines = track
            .segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.iter().map(|p| p.coordinate).collect())
            .collect();

        let markers = pois
            .iter()
            .map(|poi| MapMarker {
                coordinate: poi.coordinate(),
                label: poi.label().to_string(),
            })
            .collect();

        let center = compute_center(track).unwrap_or(Coordinate::new(0.0, 0.0));

        Self { polylines, markers, center }
    }
}

/// Escape text for inclusion in HTML or a JS string literal.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\\' => out.push_str("&#92;"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

fn latlng(c: &Coordinate) -> String {
    format!("[{}, {}]", c.latitude, c.longitude)
}

/// Render `view` as a standalone Leaflet HTML page.
pub fn render_html(view: &MapView) -> String {
    let mut script = String::new();

    let _ = writeln!(
        script,
        "var map = L.map('map').setView({}, {});",
        latlng(&view.center),
        DEFAULT_ZOOM
    );
    script.push_str(
        "L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {\n  \
         maxZoom: 19,\n  \
         attribution: '&copy; OpenStreetMap contributors'\n}).addTo(map);\n",
    );

    for line in &view.polylines {
        let coords: Vec<String> = line.iter().map(latlng).collect();
        let _ = writeln!(
            script,
            "L.polyline([{}], {{color: 'blue', weight: 2.5, opacity: 1}}).addTo(map);",
            coords.join(", ")
        );
    }

    for marker in &view.markers {
        let _ = writeln!(
            script,
            "L.marker({}).bindPopup('{}', {{maxWidth: 300}}).addTo(map);",
            latlng(&marker.coordinate),
            escape_html(&marker.label)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{v}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{v}/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; width: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
{script}</script>
</body>
</html>
"#,
        v = LEAFLET_VERSION,
        script = script
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackPoint;

    fn view() -> MapView {
        let mut track = Track::from_points(vec![TrackPoint::new(45.0, 6.0), TrackPoint::new(45.2, 6.2)]);
        track.segments.push(Vec::new());
        let pois = vec![
            PoiCandidate::new(45.1, 6.1).with_tag("amenity", "drinking_water"),
            PoiCandidate::new(45.15, 6.15).with_tag("natural", "spring"),
        ];
        MapView::new(&track, &pois)
    }

    #[test]
    fn test_map_view() {
        let view = view();
        assert_eq!(view.polylines.len(), 1);
        assert_eq!(view.polylines[0].len(), 2);
        assert_eq!(view.markers.len(), 2);
        assert_eq!(view.markers[1].label, "spring");
        assert!((view.center.latitude - 45.1).abs() < 1e-9);
        assert!((view.center.longitude - 6.1).abs() < 1e-9);
    }

    #[test]
    fn test_render_html() {
        let html = render_html(&view());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("L.polyline([[45, 6], [45.2, 6.2]]"));
        assert!(html.contains("L.marker([45.1, 6.1]).bindPopup('drinking_water'"));
        assert!(html.contains("bindPopup('spring'"));
        assert_eq!(html.matches("L.marker(").count(), 2);
    }

    #[test]
    fn test_labels_are_escaped() {
        let track = Track::from_points(vec![TrackPoint::new(0.0, 0.0)]);
        let pois = vec![PoiCandidate::new(0.0, 0.0).with_tag("name", "<b>Joe's</b>")];
        let html = render_html(&MapView::new(&track, &pois));
        assert!(html.contains("&lt;b&gt;Joe&#39;s&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }
}
