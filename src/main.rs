//! `thirsty`: add drinking water POIs to a GPX trace.
//!
//! ```text
//! thirsty ride.gpx ride-water.gpx --distance 150 --html
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use thirsty::gpx_io::{load_track, read_track, track_to_bytes};
use thirsty::http::OVERPASS_URL;
use thirsty::{
    enrich_track, render_html, MapView, OverpassClient, OverpassConfig, PoiKind, ProgressCallback,
    ProximityConfig, Track,
};

#[derive(Parser, Debug)]
#[command(name = "thirsty", version)]
#[command(about = "Add water POI to a GPX trace.")]
struct Args {
    /// Input GPX trace (file path or http(s) URL)
    input: String,

    /// Output GPX trace
    output: PathBuf,

    /// Search distance around the trace, in meters
    #[arg(short, long, default_value_t = 100.0)]
    distance: f64,

    /// Generate an HTML interactive map to <output>.html
    #[arg(long)]
    html: bool,

    /// Kind of POI to look for
    #[arg(long, value_enum, default_value_t = Kind::Water)]
    kind: Kind,

    /// Overpass interpreter URL
    #[arg(long, default_value = OVERPASS_URL)]
    overpass_url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    /// Drinking water and springs
    Water,
    /// Drinking water, springs, food and drink shops
    Food,
}

impl Kind {
    fn poi_kind(self) -> PoiKind {
        match self {
            Kind::Water => PoiKind::drinking_water(),
            Kind::Food => PoiKind::snacks_and_drinks(),
        }
    }
}

/// Attach the failing pipeline stage to library errors.
trait StageContext<T> {
    fn stage(self) -> Result<T>;
}

impl<T> StageContext<T> for thirsty::Result<T> {
    fn stage(self) -> Result<T> {
        self.map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("{} stage failed", stage))
        })
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn progress_bar(message: &'static str, template: &str) -> Result<(ProgressBar, ProgressCallback)> {
    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::default_bar().template(template)?.progress_chars("#>-"));
    pb.set_message(message);

    let callback: ProgressCallback = {
        let pb = pb.clone();
        Arc::new(move |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        })
    };
    Ok((pb, callback))
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn download_input(url: &str, client: &OverpassClient) -> Result<Track> {
    eprintln!("⏳ Downloading GPX from {}", url);
    let (pb, callback) = progress_bar(
        "Downloading",
        "{msg:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes}",
    )?;
    let data = client.download(url, Some(&callback)).stage();
    pb.finish_and_clear();
    read_track(data?.as_slice()).stage()
}

fn html_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".html");
    PathBuf::from(path)
}

/// Write `path` through a sibling temp file renamed into place, so a failed
/// write never leaves a truncated file behind.
fn write_atomically<F>(path: &Path, write: F) -> thirsty::Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let err = |e: std::io::Error| thirsty::Error::OutputWrite(format!("{}: {}", path.display(), e));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(err)?;
    write(tmp.as_file_mut()).map_err(err)?;
    tmp.as_file().sync_all().map_err(err)?;
    tmp.persist(path).map_err(|e| err(e.error))?;
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomically(path, |file| file.write_all(bytes)).stage()
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let overpass = OverpassConfig {
        url: args.overpass_url.clone(),
        timeout: Duration::from_secs(args.timeout),
    };

    // The client is only needed once there is a track to query for
    let (mut track, client) = if is_url(&args.input) {
        let client = OverpassClient::new(overpass).stage()?;
        (download_input(&args.input, &client)?, client)
    } else {
        let track = load_track(&args.input)
            .stage()
            .with_context(|| format!("reading {}", args.input))?;
        (track, OverpassClient::new(overpass).stage()?)
    };
    info!("Loaded {} points in {} segments", track.point_count(), track.segments.len());

    let kind = args.kind.poi_kind();
    let config = ProximityConfig::with_max_distance(args.distance);

    let (pb, callback) = progress_bar(
        "Filtering POI",
        "{msg:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}",
    )?;
    let accepted = enrich_track(&mut track, &client, &kind, &config, Some(&callback)).stage();
    pb.finish_and_clear();
    let accepted = accepted?;

    // Serialize fully before touching the output file
    let gpx_bytes = track_to_bytes(&track).stage()?;
    write_output(&args.output, &gpx_bytes)?;

    if args.html {
        let html = render_html(&MapView::new(&track, &accepted));
        write_output(&html_path(&args.output), html.as_bytes())?;
    }

    println!("✅ Added {} POI to {}", accepted.len(), args.output.display());
    Ok(())
}
