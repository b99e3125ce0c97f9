//! # Geographic Utilities
//!
//! Distance and bounding box computations used by the POI pipeline.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two coordinates |
//! | [`compute_bounds`] | Bounding box of a track |
//! | [`meters_to_lat_degrees`] | Latitude span covered by a distance |
//! | [`meters_to_lng_degrees`] | Upper bound on the longitude span covered by a distance |
//!
//! ## Example
//!
//! ```rust
//! use thirsty::{geo_utils, Coordinate, Track, TrackPoint};
//!
//! let track = Track::from_points(vec![
//!     TrackPoint::new(51.5074, -0.1278),  // London
//!     TrackPoint::new(51.5090, -0.1300),
//! ]);
//!
//! let bounds = geo_utils::compute_bounds(&track).unwrap();
//! println!("Bounds: {:.4}N to {:.4}N", bounds.south, bounds.north);
//!
//! let dist = geo_utils::haversine_distance(
//!     &Coordinate::new(0.0, 0.0),
//!     &Coordinate::new(0.0, 1.0),
//! );
//! assert!((dist - 111_195.0).abs() < 1_112.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! The haversine formula treats the Earth as a sphere with the mean radius
//! [`EARTH_RADIUS_M`]. Against the WGS84 ellipsoid this is off by up to ~0.5%,
//! which is irrelevant at the 100 m scale the proximity filter works at.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use crate::{BoundingBox, Coordinate, Error, Result, Track};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator) on the sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two coordinates.
///
/// Returns the distance in meters along the surface of a sphere with radius
/// [`EARTH_RADIUS_M`]. Valid for any pair of points, antipodes included.
///
/// # Example
///
/// ```rust
/// use thirsty::{Coordinate, geo_utils};
///
/// let london = Coordinate::new(51.5074, -0.1278);
/// let paris = Coordinate::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &Coordinate, p2: &Coordinate) -> f64 {
    let phi1 = p1.latitude.to_radians();
    let phi2 = p2.latitude.to_radians();
    let d_phi = (p2.latitude - p1.latitude).to_radians();
    let d_lambda = (p2.longitude - p1.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Convert a distance in meters to the latitude span it covers.
///
/// Exact on the sphere: moving `meters` along any path changes latitude by
/// at most this many degrees.
#[inline]
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Upper bound on the longitude span reachable within `meters` from any point
/// whose latitude magnitude never exceeds `max_abs_latitude`.
///
/// Derived from the haversine formula: `d < D` implies
/// `cos(φ1)·cos(φ2)·sin²(Δλ/2) < sin²(D/2R)`. Returns `None` when the bound
/// degenerates (near the poles, or `meters` spanning half the globe), meaning
/// every longitude is reachable.
pub fn meters_to_lng_degrees(meters: f64, max_abs_latitude: f64) -> Option<f64> {
    if max_abs_latitude >= 90.0 {
        return None;
    }
    let min_cos = max_abs_latitude.to_radians().cos();
    let half_angle = (meters / (2.0 * EARTH_RADIUS_M)).min(std::f64::consts::FRAC_PI_2);
    let ratio = half_angle.sin() / min_cos;
    if !ratio.is_finite() || ratio >= 1.0 {
        return None;
    }
    Some((2.0 * ratio.asin()).to_degrees())
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of every point in a track.
///
/// Latitude and longitude extremes are tracked independently in a single pass;
/// point order does not matter.
///
/// # Errors
///
/// [`Error::EmptyGeometry`] when the track has no points in any segment.
///
/// # Example
///
/// ```rust
/// use thirsty::{geo_utils, Track, TrackPoint};
///
/// let track = Track::from_points(vec![
///     TrackPoint::new(51.5000, -0.1300),
///     TrackPoint::new(51.5100, -0.1200),
///     TrackPoint::new(51.5050, -0.1250),
/// ]);
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.south, 51.5000);
/// assert_eq!(bounds.north, 51.5100);
/// assert_eq!(bounds.west, -0.1300);
/// assert_eq!(bounds.east, -0.1200);
/// ```
pub fn compute_bounds(track: &Track) -> Result<BoundingBox> {
    let mut coords = track.coordinates();
    let first = coords.next().ok_or(Error::EmptyGeometry)?;

    let mut bounds = BoundingBox {
        south: first.latitude,
        west: first.longitude,
        north: first.latitude,
        east: first.longitude,
    };

    for c in coords {
        bounds.south = bounds.south.min(c.latitude);
        bounds.north = bounds.north.max(c.latitude);
        bounds.west = bounds.west.min(c.longitude);
        bounds.east = bounds.east.max(c.longitude);
    }

    Ok(bounds)
}

/// Compute the arithmetic mean of all track coordinates.
///
/// Returns `None` for an empty track. Not meaningful for tracks crossing the
/// antimeridian.
pub fn compute_center(track: &Track) -> Option<Coordinate> {
    use geo::Centroid;

    let points: geo::MultiPoint<f64> = track
        .coordinates()
        .map(|c| geo::Point::from(*c))
        .collect::<Vec<_>>()
        .into();
    points.centroid().map(Coordinate::from)
}

// =============================================================================
// Unit Tests
// =============================================================================
