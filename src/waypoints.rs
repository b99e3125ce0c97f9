//! Merging accepted POIs into a track as waypoints.

use log::debug;

use crate::{PoiCandidate, PoiKind, Track, Waypoint};

/// Build the waypoint for one accepted POI.
fn waypoint_for(poi: &PoiCandidate, kind: &PoiKind) -> Waypoint {
    Waypoint {
        name: Some(kind.label.clone()),
        description: Some(kind.label.clone()),
        symbol: Some(kind.symbol.clone()),
        ..Waypoint::new(poi.coordinate())
    }
}

/// Append one waypoint per POI to `track`, in iteration order.
///
/// Path segments are left untouched. Calling this twice with the same POIs
/// adds them twice. Returns the number of waypoints added.
pub fn add_waypoints<'a, I>(track: &mut Track, pois: I, kind: &PoiKind) -> usize
where
    I: IntoIterator<Item = &'a PoiCandidate>,
{
    let before = track.waypoints.len();
    track
        .waypoints
        .extend(pois.into_iter().map(|poi| waypoint_for(poi, kind)));

    let added = track.waypoints.len() - before;
    debug!("Added {} '{}' waypoints", added, kind.label);
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, TrackPoint};

    fn track() -> Track {
        Track::from_points(vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 0.001)])
    }

    #[test]
    fn test_add_water_waypoint() {
        let mut track = track();
        let pois = vec![PoiCandidate::new(0.0, 0.0005).with_tag("amenity", "drinking_water")];

        let added = add_waypoints(&mut track, &pois, &PoiKind::drinking_water());

        assert_eq!(added, 1);
        let wpt = &track.waypoints[0];
        assert_eq!(wpt.coordinate, Coordinate::new(0.0, 0.0005));
        assert_eq!(wpt.name.as_deref(), Some("Water"));
        assert_eq!(wpt.description.as_deref(), Some("Water"));
        assert_eq!(wpt.symbol.as_deref(), Some("water-drop"));
    }

    #[test]
    fn test_segments_untouched_and_order_kept() {
        let mut track = track();
        track.waypoints.push(Waypoint::new(Coordinate::new(9.0, 9.0)));
        let original_segments = track.segments.clone();

        let pois = vec![PoiCandidate::new(1.0, 1.0), PoiCandidate::new(2.0, 2.0), PoiCandidate::new(3.0, 3.0)];
        let added = add_waypoints(&mut track, &pois, &PoiKind::snacks_and_drinks());

        assert_eq!(added, 3);
        assert_eq!(track.waypoints.len(), 4);
        assert_eq!(track.segments, original_segments);

        let lats: Vec<f64> = track.waypoints.iter().map(|w| w.coordinate.latitude).collect();
        assert_eq!(lats, vec![9.0, 1.0, 2.0, 3.0]);
        assert_eq!(track.waypoints[1].name.as_deref(), Some("Food"));
    }

    #[test]
    fn test_repeat_call_duplicates() {
        let mut track = track();
        let pois = vec![PoiCandidate::new(0.0, 0.0005)];
        let kind = PoiKind::drinking_water();

        add_waypoints(&mut track, &pois, &kind);
        add_waypoints(&mut track, &pois, &kind);

        assert_eq!(track.waypoints.len(), 2);
        assert_eq!(track.waypoints[0], track.waypoints[1]);
    }

    #[test]
    fn test_no_pois() {
        let mut track = track();
        assert_eq!(add_waypoints(&mut track, Vec::<&PoiCandidate>::new(), &PoiKind::drinking_water()), 0);
        assert!(track.waypoints.is_empty());
    }
}
