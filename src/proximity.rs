//! Proximity filtering of POI candidates against a track.
//!
//! A candidate is kept when at least one track point lies strictly closer
//! than the configured distance. Three implementations give identical,
//! order-preserving results:
//!
//! - [`filter_near_track`]: linear scan, O(candidates × points)
//! - [`filter_near_track_parallel`]: the same scan spread over rayon (feature `parallel`)
//! - [`TrackIndex::filter`]: R-tree pre-index of the track points, for long tracks

use log::debug;
use rstar::{RTree, AABB};

use crate::geo_utils::{haversine_distance, meters_to_lat_degrees, meters_to_lng_degrees};
use crate::{Coordinate, PoiCandidate, ProgressCallback, Track};

/// Default search distance around the track, in meters.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 100.0;

/// Widens index envelopes to absorb floating point error in the bounds.
const ENVELOPE_SLACK: f64 = 1.0 + 1e-9;

/// Configuration for proximity filtering.
#[derive(Debug, Clone)]
pub struct ProximityConfig {
    /// Candidates must be strictly closer than this to some track point.
    /// Default: 100.0 meters
    pub max_distance_m: f64,

    /// Above this many (candidates × track points) distance evaluations the
    /// pipeline builds a [`TrackIndex`] instead of scanning.
    /// Default: 5,000,000
    pub index_threshold: usize,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
            index_threshold: 5_000_000,
        }
    }
}

impl ProximityConfig {
    pub fn with_max_distance(max_distance_m: f64) -> Self {
        Self {
            max_distance_m,
            ..Self::default()
        }
    }
}

/// Check whether any track point is strictly within `max_distance_m` of `poi`.
fn is_near<'a>(mut points: impl Iterator<Item = &'a Coordinate>, poi: &Coordinate, max_distance_m: f64) -> bool {
    points.any(|p| haversine_distance(poi, p) < max_distance_m)
}

fn report(progress: Option<&ProgressCallback>, done: usize, total: usize) {
    if let Some(cb) = progress {
        cb(done as u32, total as u32);
    }
}

/// Keep the candidates lying within `config.max_distance_m` of any track point.
///
/// The result is a subsequence of `candidates` in the original order.
/// Candidates with invalid coordinates are dropped. `progress`, when given,
/// is called with `(done, total)` after each candidate.
///
/// # Example
/// ```
/// use thirsty::{filter_near_track, PoiCandidate, ProximityConfig, Track, TrackPoint};
///
/// let track = Track::from_points(vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 0.001)]);
/// let candidates = vec![PoiCandidate::new(0.0, 0.0005), PoiCandidate::new(10.0, 10.0)];
///
/// let near = filter_near_track(&track, &candidates, &ProximityConfig::default(), None);
/// assert_eq!(near, vec![&candidates[0]]);
/// ```
pub fn filter_near_track<'a>(
    track: &Track,
    candidates: &'a [PoiCandidate],
    config: &ProximityConfig,
    progress: Option<&ProgressCallback>,
) -> Vec<&'a PoiCandidate> {
    let total = candidates.len();
    let mut near = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let poi = candidate.coordinate();
        if poi.is_valid() && is_near(track.coordinates(), &poi, config.max_distance_m) {
            near.push(candidate);
        }
        report(progress, i + 1, total);
    }

    debug!(
        "Kept {} of {} candidates within {}m of {} track points",
        near.len(),
        total,
        config.max_distance_m,
        track.point_count()
    );
    near
}

/// Parallel version of [`filter_near_track`] using rayon.
///
/// Each candidate is tested independently; the output keeps input order.
/// Progress is reported as candidates complete, so `done` is monotonic
/// but the completed candidates are not necessarily a prefix.
#[cfg(feature = "parallel")]
pub fn filter_near_track_parallel<'a>(
    track: &Track,
    candidates: &'a [PoiCandidate],
    config: &ProximityConfig,
    progress: Option<&ProgressCallback>,
) -> Vec<&'a PoiCandidate> {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let points: Vec<Coordinate> = track.coordinates().copied().collect();
    let total = candidates.len();
    let completed = AtomicUsize::new(0);

    candidates
        .par_iter()
        .filter(|candidate| {
            let poi = candidate.coordinate();
            let keep = poi.is_valid() && is_near(points.iter(), &poi, config.max_distance_m);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            report(progress, done, total);
            keep
        })
        .collect()
}

/// R-tree of track points for sub-linear candidate lookups.
///
/// Points are stored as `[longitude, latitude]`. Each lookup searches a
/// lat/lng envelope that is guaranteed to contain every point within the
/// distance, then applies the exact haversine test, so results match
/// [`filter_near_track`] exactly.
pub struct TrackIndex {
    tree: RTree<[f64; 2]>,
}

impl TrackIndex {
    /// Build an index over all valid points of `track`.
    pub fn new(track: &Track) -> Self {
        let points: Vec<[f64; 2]> = track
            .coordinates()
            .filter(|c| c.is_valid())
            .map(|c| [c.longitude, c.latitude])
            .collect();

        Self {
            tree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search envelopes around `poi`, split in two when the longitude window
    /// wraps around the antimeridian.
    fn envelopes(&self, poi: &Coordinate, max_distance_m: f64) -> Vec<AABB<[f64; 2]>> {
        let d_lat = meters_to_lat_degrees(max_distance_m) * ENVELOPE_SLACK;
        let south = (poi.latitude - d_lat).max(-90.0);
        let north = (poi.latitude + d_lat).min(90.0);

        // Both the poi and any matching point lie within [south, north]
        let lat_bound = south.abs().max(north.abs());
        let d_lng = match meters_to_lng_degrees(max_distance_m, lat_bound) {
            Some(d) if d * ENVELOPE_SLACK < 180.0 => d * ENVELOPE_SLACK,
            _ => return vec![AABB::from_corners([-180.0, south], [180.0, north])],
        };

        let west = poi.longitude - d_lng;
        let east = poi.longitude + d_lng;
        let mut envelopes = vec![AABB::from_corners([west.max(-180.0), south], [east.min(180.0), north])];
        if west < -180.0 {
            envelopes.push(AABB::from_corners([west + 360.0, south], [180.0, north]));
        }
        if east > 180.0 {
            envelopes.push(AABB::from_corners([-180.0, south], [east - 360.0, north]));
        }
        envelopes
    }

    fn is_near(&self, poi: &Coordinate, max_distance_m: f64) -> bool {
        self.envelopes(poi, max_distance_m).iter().any(|envelope| {
            self.tree.locate_in_envelope(envelope).any(|p| {
                let point = Coordinate::new(p[1], p[0]);
                haversine_distance(poi, &point) < max_distance_m
            })
        })
    }

    /// Indexed equivalent of [`filter_near_track`].
    pub fn filter<'a>(
        &self,
        candidates: &'a [PoiCandidate],
        config: &ProximityConfig,
        progress: Option<&ProgressCallback>,
    ) -> Vec<&'a PoiCandidate> {
        let total = candidates.len();
        let mut near = Vec::new();

        for (i, candidate) in candidates.iter().enumerate() {
            let poi = candidate.coordinate();
            if poi.is_valid() && self.is_near(&poi, config.max_distance_m) {
                near.push(candidate);
            }
            report(progress, i + 1, total);
        }

        debug!(
            "Kept {} of {} candidates within {}m of {} indexed track points",
            near.len(),
            total,
            config.max_distance_m,
            self.len()
        );
        near
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::METERS_PER_DEGREE;
    use crate::TrackPoint;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn water(lat: f64, lon: f64) -> PoiCandidate {
        PoiCandidate::new(lat, lon).with_tag("amenity", "drinking_water")
    }

    fn equator_track() -> Track {
        Track::from_points(vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 0.001)])
    }

    /// Alpine-ish zig-zag track, ~100 points
    fn long_track() -> Track {
        let points = (0..100)
            .map(|i| {
                let lat = 45.0 + i as f64 * 0.0005;
                let lng = 6.0 + if i % 2 == 0 { 0.0 } else { 0.0004 };
                TrackPoint::new(lat, lng)
            })
            .collect();
        Track::from_points(points)
    }

    fn candidate_grid() -> Vec<PoiCandidate> {
        let mut candidates = Vec::new();
        for i in 0..30 {
            for j in 0..10 {
                candidates.push(water(44.995 + i as f64 * 0.002, 5.998 + j as f64 * 0.0003));
            }
        }
        candidates
    }

    #[test]
    fn test_end_to_end_scenario() {
        let track = equator_track();
        let candidates = vec![water(0.0, 0.0005), water(10.0, 10.0)];
        let near = filter_near_track(&track, &candidates, &ProximityConfig::default(), None);
        assert_eq!(near, vec![&candidates[0]]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let track = Track::from_points(vec![TrackPoint::new(0.0, 0.0)]);
        let poi = water(0.0, 0.0005);
        let exact = haversine_distance(&Coordinate::new(0.0, 0.0), &poi.coordinate());
        let candidates = vec![poi];

        let at = ProximityConfig::with_max_distance(exact);
        assert!(filter_near_track(&track, &candidates, &at, None).is_empty());
        assert!(TrackIndex::new(&track).filter(&candidates, &at, None).is_empty());

        let above = ProximityConfig::with_max_distance(exact + 0.01);
        assert_eq!(filter_near_track(&track, &candidates, &above, None).len(), 1);
        assert_eq!(TrackIndex::new(&track).filter(&candidates, &above, None).len(), 1);
    }

    #[test]
    fn test_hundred_meter_boundary() {
        // Straight north of the only track point
        let track = Track::from_points(vec![TrackPoint::new(0.0, 0.0)]);
        let candidates = vec![
            water(100.01 / METERS_PER_DEGREE, 0.0),
            water(99.99 / METERS_PER_DEGREE, 0.0),
        ];

        let near = filter_near_track(&track, &candidates, &ProximityConfig::default(), None);
        assert_eq!(near, vec![&candidates[1]]);
    }

    #[test]
    fn test_filter_is_stable_subsequence() {
        let track = long_track();
        let candidates = candidate_grid();
        let config = ProximityConfig::default();
        let near = filter_near_track(&track, &candidates, &config, None);

        assert!(!near.is_empty());
        assert!(near.len() < candidates.len());

        // Subsequence in order
        let positions: Vec<usize> = near
            .iter()
            .map(|n| candidates.iter().position(|c| std::ptr::eq(c, *n)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        // Kept and excluded candidates respect the threshold
        for candidate in &candidates {
            let poi = candidate.coordinate();
            let min = track
                .coordinates()
                .map(|p| haversine_distance(&poi, p))
                .fold(f64::INFINITY, f64::min);
            let kept = near.iter().any(|n| std::ptr::eq(*n, candidate));
            assert_eq!(kept, min < config.max_distance_m);
        }
    }

    #[test]
    fn test_multiple_segments() {
        let mut track = Track::from_points(vec![TrackPoint::new(0.0, 0.0)]);
        track.segments.push(vec![TrackPoint::new(1.0, 1.0)]);
        let candidates = vec![water(1.0, 1.0002)];
        let near = filter_near_track(&track, &candidates, &ProximityConfig::default(), None);
        assert_eq!(near.len(), 1);
    }

    #[test]
    fn test_invalid_candidates_are_dropped() {
        let track = equator_track();
        let candidates = vec![water(f64::NAN, 0.0), water(0.0, 0.0)];
        let near = filter_near_track(&track, &candidates, &ProximityConfig::default(), None);
        assert_eq!(near, vec![&candidates[1]]);
    }

    #[test]
    fn test_empty_inputs() {
        let config = ProximityConfig::default();
        assert!(filter_near_track(&Track::default(), &[water(0.0, 0.0)], &config, None).is_empty());
        assert!(filter_near_track(&equator_track(), &[], &config, None).is_empty());

        let index = TrackIndex::new(&Track::default());
        assert!(index.is_empty());
        assert!(index.filter(&[water(0.0, 0.0)], &config, None).is_empty());
    }

    #[test]
    fn test_progress_reporting() {
        let calls = Arc::new(AtomicU32::new(0));
        let last = Arc::new(AtomicU32::new(0));
        let cb: ProgressCallback = {
            let calls = Arc::clone(&calls);
            let last = Arc::clone(&last);
            Arc::new(move |done, total| {
                assert_eq!(total, 3);
                calls.fetch_add(1, Ordering::Relaxed);
                last.store(done, Ordering::Relaxed);
            })
        };

        let candidates = vec![water(0.0, 0.0), water(5.0, 5.0), water(0.0, 0.001)];
        let near = filter_near_track(&equator_track(), &candidates, &ProximityConfig::default(), Some(&cb));

        assert_eq!(near.len(), 2);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(last.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_index_matches_scan() {
        let track = long_track();
        let candidates = candidate_grid();
        let index = TrackIndex::new(&track);
        assert_eq!(index.len(), 100);

        for distance in [10.0, 50.0, 100.0, 250.0, 1000.0] {
            let config = ProximityConfig::with_max_distance(distance);
            let scan = filter_near_track(&track, &candidates, &config, None);
            let indexed = index.filter(&candidates, &config, None);
            assert_eq!(scan, indexed, "mismatch at {}m", distance);
        }
    }

    #[test]
    fn test_index_high_latitude() {
        // Longitude degrees are short near the pole
        let track = Track::from_points(vec![TrackPoint::new(89.999, 0.0), TrackPoint::new(78.2, 15.6)]);
        let candidates = vec![water(89.9995, 30.0), water(78.2, 15.6035), water(78.2, 15.62)];
        let config = ProximityConfig::default();

        let scan = filter_near_track(&track, &candidates, &config, None);
        let indexed = TrackIndex::new(&track).filter(&candidates, &config, None);
        assert_eq!(scan, indexed);
        assert_eq!(scan.len(), 2);
    }

    #[test]
    fn test_index_across_antimeridian() {
        let track = Track::from_points(vec![TrackPoint::new(-16.5, 179.9999)]);
        let candidates = vec![water(-16.5, -179.9999), water(-16.5, -179.99)];
        let config = ProximityConfig::default();

        let scan = filter_near_track(&track, &candidates, &config, None);
        let indexed = TrackIndex::new(&track).filter(&candidates, &config, None);
        assert_eq!(scan, vec![&candidates[0]]);
        assert_eq!(scan, indexed);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_scan() {
        let track = long_track();
        let candidates = candidate_grid();
        let config = ProximityConfig::default();

        let scan = filter_near_track(&track, &candidates, &config, None);
        let parallel = filter_near_track_parallel(&track, &candidates, &config, None);
        assert_eq!(scan, parallel);
    }
}
