//! Offline example: enrich a short GPX track with canned POI candidates.
//!
//! Run with: cargo run --example water_on_route --no-default-features

use thirsty::gpx_io::track_to_bytes;
use thirsty::{
    enrich_track, read_track, render_html, MapView, PoiCandidate, PoiKind, ProximityConfig,
};

const ROUTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="demo" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Grenoble loop</name>
    <trkseg>
      <trkpt lat="45.1885" lon="5.7245"/>
      <trkpt lat="45.1900" lon="5.7300"/>
      <trkpt lat="45.1920" lon="5.7350"/>
      <trkpt lat="45.1950" lon="5.7400"/>
    </trkseg>
  </trk>
</gpx>"#;

fn main() -> thirsty::Result<()> {
    let mut track = read_track(ROUTE.as_bytes())?;
    println!("Loaded {} points", track.point_count());

    // Stand-in for the Overpass API
    let source = |query: &str| -> thirsty::Result<Vec<PoiCandidate>> {
        println!("Query:\n{}\n", query);
        Ok(vec![
            PoiCandidate::new(45.1902, 5.7301).with_tag("amenity", "drinking_water"),
            PoiCandidate::new(45.1921, 5.7352).with_tag("natural", "spring"),
            PoiCandidate::new(45.2100, 5.7000).with_tag("amenity", "drinking_water"),
        ])
    };

    let kind = PoiKind::drinking_water();
    let config = ProximityConfig::default();
    let accepted = enrich_track(&mut track, &source, &kind, &config, None)?;

    println!("Accepted {} POI within {}m:", accepted.len(), config.max_distance_m);
    for poi in &accepted {
        println!("  {} at ({}, {})", poi.label(), poi.latitude, poi.longitude);
    }

    let gpx = track_to_bytes(&track)?;
    println!("\nGPX output: {} bytes, {} waypoints", gpx.len(), track.waypoints.len());

    let html = render_html(&MapView::new(&track, &accepted));
    println!("HTML map: {} bytes", html.len());

    Ok(())
}
