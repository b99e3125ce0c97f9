//! # Thirsty
//!
//! Find drinking water (and other points of interest) along a GPS track.
//!
//! This library provides:
//! - Bounding box and haversine utilities for GPX tracks
//! - Overpass QL query construction for tag-based POI categories
//! - Proximity filtering of POI candidates against the actual track geometry
//! - Merging accepted POIs back into the track as GPX waypoints
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel proximity filtering with rayon
//! - **`http`** - Enable the Overpass client and GPX downloads
//! - **`cli`** - Build the `thirsty` command line tool
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use thirsty::{
//!     add_waypoints, filter_near_track, Coordinate, PoiCandidate, PoiKind, ProximityConfig,
//!     Track, TrackPoint,
//! };
//!
//! let mut track = Track::from_points(vec![
//!     TrackPoint::new(0.0, 0.0),
//!     TrackPoint::new(0.0, 0.001),
//! ]);
//!
//! let candidates = vec![
//!     PoiCandidate::new(0.0, 0.0005).with_tag("amenity", "drinking_water"),
//!     PoiCandidate::new(10.0, 10.0).with_tag("amenity", "drinking_water"),
//! ];
//!
//! let accepted = filter_near_track(&track, &candidates, &ProximityConfig::default(), None);
//! assert_eq!(accepted.len(), 1);
//!
//! add_waypoints(&mut track, accepted, &PoiKind::drinking_water());
//! assert_eq!(track.waypoints[0].name.as_deref(), Some("Water"));
//! assert_eq!(track.waypoints[0].coordinate, Coordinate::new(0.0, 0.0005));
//! ```

use std::sync::Arc;

pub mod geo_utils;
pub use geo_utils::{compute_bounds, haversine_distance, EARTH_RADIUS_M};

pub mod query;
pub use query::{build_query, PoiCategory, PoiKind};

pub mod poi;
pub use poi::{parse_overpass_response, PoiCandidate};

pub mod proximity;
pub use proximity::{filter_near_track, ProximityConfig, TrackIndex};

#[cfg(feature = "parallel")]
pub use proximity::filter_near_track_parallel;

pub mod waypoints;
pub use waypoints::add_waypoints;

pub mod gpx_io;
pub use gpx_io::{read_track, write_track};

pub mod map;
pub use map::{render_html, MapMarker, MapView};

pub mod pipeline;
pub use pipeline::{enrich_track, PoiSource};

// HTTP module for Overpass queries and GPX downloads
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{OverpassClient, OverpassConfig};

/// Progress callback type, called with `(done, total)`.
pub type ProgressCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

// ============================================================================
// Errors
// ============================================================================

/// Errors produced by the POI pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("track has no points")]
    EmptyGeometry,

    #[error("query submission failed: {0}")]
    QuerySubmission(String),

    #[error("malformed query response: {0}")]
    MalformedResponse(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("failed to download track: {0}")]
    Download(String),

    #[error("failed to write output: {0}")]
    OutputWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the pipeline stage the error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::EmptyGeometry => "geometry",
            Error::QuerySubmission(_) | Error::MalformedResponse(_) => "query",
            Error::GpxParse(_) | Error::Download(_) | Error::Io(_) => "input",
            Error::OutputWrite(_) => "write",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use thirsty::Coordinate;
/// let point = Coordinate::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the coordinate is finite and within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.longitude, c.latitude)
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(p: geo::Point<f64>) -> Self {
        Coordinate::new(p.y(), p.x())
    }
}

/// A single recorded point of a track.
///
/// Elevation and time are carried through unchanged; the matching pipeline
/// only looks at the coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub coordinate: Coordinate,
    pub elevation: Option<f64>,
    pub time: Option<gpx::Time>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            elevation: None,
            time: None,
        }
    }
}

/// A named point attached to a track, separate from its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub coordinate: Coordinate,
    pub name: Option<String>,
    pub description: Option<String>,
    pub symbol: Option<String>,
    pub elevation: Option<f64>,
    pub time: Option<gpx::Time>,
}

impl Waypoint {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            name: None,
            description: None,
            symbol: None,
            elevation: None,
            time: None,
        }
    }
}

/// A GPS track: ordered segments of points plus a list of waypoints.
///
/// Segment and point order is the path order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub segments: Vec<Vec<TrackPoint>>,
    pub waypoints: Vec<Waypoint>,
    /// Document the track was read from, if any. Writing starts from it so
    /// metadata, routes and the per-`<trk>` layout survive.
    pub source: Option<gpx::Gpx>,
}

impl Track {
    /// Create a single-segment track.
    pub fn from_points(points: Vec<TrackPoint>) -> Self {
        Self {
            name: None,
            segments: vec![points],
            waypoints: Vec::new(),
            source: None,
        }
    }

    /// Iterate over all point coordinates across every segment, in path order.
    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| segment.iter().map(|p| &p.coordinate))
    }

    /// Total number of points across all segments.
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

/// Minimal axis-aligned lat/lng rectangle enclosing a track.
///
/// `south <= north` and `west <= east`; tracks crossing the antimeridian
/// get a box spanning the long way around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Check whether a coordinate lies inside the box (edges included).
    pub fn contains(&self, c: &Coordinate) -> bool {
        c.latitude >= self.south
            && c.latitude <= self.north
            && c.longitude >= self.west
            && c.longitude <= self.east
    }

    /// Get the center point of the box.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
