//! The POI pipeline: bounds, query, fetch, filter, merge.

use log::info;

use crate::geo_utils::compute_bounds;
use crate::proximity::{ProximityConfig, TrackIndex};
use crate::waypoints::add_waypoints;
use crate::{PoiCandidate, PoiKind, ProgressCallback, Result, Track};

/// Anything that can answer an Overpass query with POI candidates.
///
/// Implemented by [`crate::OverpassClient`] (feature `http`); tests and
/// offline callers can supply their own.
pub trait PoiSource {
    /// Run `query` and return the decoded candidates.
    ///
    /// Transport failures map to [`crate::Error::QuerySubmission`],
    /// undecodable bodies to [`crate::Error::MalformedResponse`].
    fn fetch(&self, query: &str) -> Result<Vec<PoiCandidate>>;
}

impl<F> PoiSource for F
where
    F: Fn(&str) -> Result<Vec<PoiCandidate>>,
{
    fn fetch(&self, query: &str) -> Result<Vec<PoiCandidate>> {
        self(query)
    }
}

fn filter_candidates<'a>(
    track: &Track,
    candidates: &'a [PoiCandidate],
    config: &ProximityConfig,
    progress: Option<&ProgressCallback>,
) -> Vec<&'a PoiCandidate> {
    let work = track.point_count().saturating_mul(candidates.len());
    if work > config.index_threshold {
        info!("Indexing {} track points for {} candidates", track.point_count(), candidates.len());
        return TrackIndex::new(track).filter(candidates, config, progress);
    }

    #[cfg(feature = "parallel")]
    {
        crate::proximity::filter_near_track_parallel(track, candidates, config, progress)
    }
    #[cfg(not(feature = "parallel"))]
    {
        crate::proximity::filter_near_track(track, candidates, config, progress)
    }
}

/// Find POIs of `kind` near `track` and append them as waypoints.
///
/// Returns the accepted candidates in query order. On error the track is
/// left unchanged.
///
/// # Example
/// ```
/// use thirsty::{enrich_track, PoiCandidate, PoiKind, ProximityConfig, Result, Track, TrackPoint};
///
/// let mut track = Track::from_points(vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 0.001)]);
/// let source = |_query: &str| -> Result<Vec<PoiCandidate>> {
///     Ok(vec![PoiCandidate::new(0.0, 0.0005), PoiCandidate::new(10.0, 10.0)])
/// };
///
/// let accepted = enrich_track(&mut track, &source, &PoiKind::drinking_water(), &ProximityConfig::default(), None)?;
/// assert_eq!(accepted.len(), 1);
/// assert_eq!(track.waypoints.len(), 1);
/// # Ok::<(), thirsty::Error>(())
/// ```
pub fn enrich_track(
    track: &mut Track,
    source: &dyn PoiSource,
    kind: &PoiKind,
    config: &ProximityConfig,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<PoiCandidate>> {
    let bounds = compute_bounds(track)?;
    let query = kind.query(&bounds);
    log::debug!("Overpass query:\n{}", query);

    let candidates = source.fetch(&query)?;
    info!("Query returned {} candidates", candidates.len());

    let accepted: Vec<PoiCandidate> = filter_candidates(track, &candidates, config, progress)
        .into_iter()
        .cloned()
        .collect();
    info!(
        "{} of {} candidates within {}m of the track",
        accepted.len(),
        candidates.len(),
        config.max_distance_m
    );

    add_waypoints(track, &accepted, kind);
    Ok(accepted)
}
