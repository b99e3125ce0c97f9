//! GPX reading and writing.
//!
//! Converts between [`gpx::Gpx`] documents and [`Track`]. All `<trk>`
//! elements of a document are read into one [`Track`], their segments
//! concatenated in document order. The parsed document is kept on the track,
//! so writing only changes what the pipeline changed: metadata, routes,
//! track names and existing `<wpt>` elements come back out as they went in.

use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::{Coordinate, Error, Result, Track, TrackPoint, Waypoint};

/// Creator attribute written to output files.
pub const CREATOR: &str = "thirsty";

fn track_point_from_gpx(wpt: &gpx::Waypoint) -> TrackPoint {
    TrackPoint {
        coordinate: Coordinate::from(wpt.point()),
        elevation: wpt.elevation,
        time: wpt.time.clone(),
    }
}

fn track_point_to_gpx(point: &TrackPoint) -> gpx::Waypoint {
    let mut wpt = gpx::Waypoint::new(point.coordinate.into());
    wpt.elevation = point.elevation;
    wpt.time = point.time.clone();
    wpt
}

fn waypoint_from_gpx(wpt: &gpx::Waypoint) -> Waypoint {
    Waypoint {
        coordinate: Coordinate::from(wpt.point()),
        name: wpt.name.clone(),
        description: wpt.description.clone(),
        symbol: wpt.symbol.clone(),
        elevation: wpt.elevation,
        time: wpt.time.clone(),
    }
}

fn waypoint_to_gpx(waypoint: &Waypoint) -> gpx::Waypoint {
    let mut wpt = gpx::Waypoint::new(waypoint.coordinate.into());
    wpt.name = waypoint.name.clone();
    wpt.description = waypoint.description.clone();
    wpt.symbol = waypoint.symbol.clone();
    wpt.elevation = waypoint.elevation;
    wpt.time = waypoint.time.clone();
    wpt
}

/// Convert `current` back to GPX points, reusing each parsed `original`
/// element that still reads as the same value. Fields the model does not
/// carry (comments, links, fix data) are kept that way.
fn merge_points<T: PartialEq>(
    original: &[gpx::Waypoint],
    current: &[T],
    read: fn(&gpx::Waypoint) -> T,
    write: fn(&T) -> gpx::Waypoint,
) -> Vec<gpx::Waypoint> {
    current
        .iter()
        .enumerate()
        .map(|(i, item)| match original.get(i) {
            Some(orig) if read(orig) == *item => orig.clone(),
            _ => write(item),
        })
        .collect()
}

impl From<&gpx::Gpx> for Track {
    fn from(doc: &gpx::Gpx) -> Self {
        let name = doc.tracks.iter().find_map(|t| t.name.clone());
        let segments = doc
            .tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .map(|s| s.points.iter().map(track_point_from_gpx).collect())
            .collect();
        let waypoints = doc.waypoints.iter().map(waypoint_from_gpx).collect();

        Track {
            name,
            segments,
            waypoints,
            source: Some(doc.clone()),
        }
    }
}

impl From<&Track> for gpx::Gpx {
    /// Starts from the source document when there is one. Segments are
    /// written back into the source `<trk>` elements as long as their count
    /// still matches; otherwise all segments go into a single new `<trk>`.
    fn from(track: &Track) -> Self {
        let mut doc = match &track.source {
            Some(source) => source.clone(),
            None => {
                let mut doc = gpx::Gpx::default();
                doc.version = gpx::GpxVersion::Gpx11;
                doc.creator = Some(CREATOR.to_string());
                doc
            }
        };

        doc.waypoints = merge_points(&doc.waypoints, &track.waypoints, waypoint_from_gpx, waypoint_to_gpx);

        let source_segments: usize = doc.tracks.iter().map(|t| t.segments.len()).sum();
        if source_segments == track.segments.len() {
            let mut current = track.segments.iter();
            for segment in doc.tracks.iter_mut().flat_map(|t| t.segments.iter_mut()) {
                if let Some(points) = current.next() {
                    segment.points = merge_points(&segment.points, points, track_point_from_gpx, track_point_to_gpx);
                }
            }
        } else {
            log::debug!(
                "Track has {} segments, source had {}; writing a single <trk>",
                track.segments.len(),
                source_segments
            );
            let mut gpx_track = gpx::Track::default();
            gpx_track.name = track.name.clone();
            gpx_track.segments = track
                .segments
                .iter()
                .map(|points| {
                    let mut segment = gpx::TrackSegment::default();
                    segment.points = points.iter().map(track_point_to_gpx).collect();
                    segment
                })
                .collect();
            doc.tracks = vec![gpx_track];
        }

        doc
    }
}

/// Parse a GPX document into a [`Track`].
pub fn read_track<R: Read>(reader: R) -> Result<Track> {
    let doc = gpx::read(reader)?;
    let track = Track::from(&doc);
    log::debug!(
        "Read GPX with {} segments, {} points, {} waypoints",
        track.segments.len(),
        track.point_count(),
        track.waypoints.len()
    );
    Ok(track)
}

/// Parse a GPX file from disk.
pub fn load_track<P: AsRef<Path>>(path: P) -> Result<Track> {
    let file = std::fs::File::open(path.as_ref())?;
    read_track(BufReader::new(file))
}

/// Serialize a [`Track`] as GPX 1.1.
///
/// # Errors
///
/// [`Error::OutputWrite`] when serialization or the underlying writer fails.
pub fn write_track<W: Write>(track: &Track, writer: W) -> Result<()> {
    let doc = gpx::Gpx::from(track);
    gpx::write(&doc, writer).map_err(|e| Error::OutputWrite(e.to_string()))
}

/// Serialize a [`Track`] into an in-memory GPX document.
pub fn track_to_bytes(track: &Track) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_track(track, &mut buffer)?;
    Ok(buffer)
}
