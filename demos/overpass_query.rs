//! Query the public Overpass API for water points around a small area.
//!
//! Run with: cargo run --example overpass_query --features http

use thirsty::{compute_bounds, OverpassClient, OverpassConfig, PoiKind, Track, TrackPoint};

fn main() -> thirsty::Result<()> {
    let track = Track::from_points(vec![
        TrackPoint::new(45.1885, 5.7245),
        TrackPoint::new(45.1950, 5.7400),
    ]);

    let bounds = compute_bounds(&track)?;
    let query = PoiKind::drinking_water().query(&bounds);
    println!("{}\n", query);

    let client = OverpassClient::new(OverpassConfig::default())?;
    let candidates = client.query(&query)?;

    println!("{} candidates in bounding box", candidates.len());
    for poi in candidates.iter().take(10) {
        println!("  {:?} {} ({:.5}, {:.5})", poi.id, poi.label(), poi.latitude, poi.longitude);
    }
    Ok(())
}
