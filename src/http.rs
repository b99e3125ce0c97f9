//! HTTP client for the Overpass API and GPX downloads.
//!
//! The client is async (reqwest on tokio) but owns a current-thread runtime
//! so the pipeline can call it synchronously: one query, one complete
//! response, no retries.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;
use tokio::runtime::{Builder, Runtime};

use crate::pipeline::PoiSource;
use crate::poi::parse_overpass_response;
use crate::{Error, PoiCandidate, ProgressCallback, Result};

/// Public Overpass endpoint.
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const USER_AGENT: &str = concat!("thirsty/", env!("CARGO_PKG_VERSION"));

const MAX_PREALLOC_BYTES: u64 = 1 << 20;

/// The runtime only exists to drive Overpass requests.
fn runtime_error(e: std::io::Error) -> Error {
    Error::QuerySubmission(format!("Failed to start async runtime: {}", e))
}

fn clamp_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Overpass client settings.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoint.
    /// Default: [`OVERPASS_URL`]
    pub url: String,

    /// Client-side timeout for a whole request.
    /// Default: 60 seconds (the query itself asks the server for 25)
    pub timeout: Duration,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: OVERPASS_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Blocking Overpass client.
pub struct OverpassClient {
    client: Client,
    config: OverpassConfig,
    runtime: Runtime,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::QuerySubmission(format!("Failed to create HTTP client: {}", e)))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(runtime_error)?;

        Ok(Self { client, config, runtime })
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    /// Submit `query` and decode the returned elements.
    pub async fn query_async(&self, query: &str) -> Result<Vec<PoiCandidate>> {
        let start = Instant::now();
        info!("[Overpass] POST {} ({} bytes)", self.config.url, query.len());

        let response = self
            .client
            .post(self.config.url.as_str())
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| Error::QuerySubmission(format!("Request error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("[Overpass] Error body: {}", body.chars().take(500).collect::<String>());
            return Err(Error::QuerySubmission(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::QuerySubmission(format!("Body download error: {}", e)))?;

        let candidates = parse_overpass_response(&bytes)?;
        info!(
            "[Overpass] {} candidates ({:.1}KB) in {:.2}s",
            candidates.len(),
            bytes.len() as f64 / 1024.0,
            start.elapsed().as_secs_f64()
        );
        Ok(candidates)
    }

    /// Blocking wrapper around [`OverpassClient::query_async`].
    pub fn query(&self, query: &str) -> Result<Vec<PoiCandidate>> {
        self.runtime.block_on(self.query_async(query))
    }

    /// Download a file, typically a GPX track, reporting `(bytes, total)` progress.
    ///
    /// `total` is 0 when the server sends no `Content-Length`.
    pub async fn download_async(&self, url: &str, on_progress: Option<&ProgressCallback>) -> Result<Vec<u8>> {
        info!("Downloading {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Download(format!("Request error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download(format!("HTTP {}", status)));
        }

        // Content-Length is only a hint: never preallocate more than this
        let total = response.content_length().unwrap_or(0);
        let mut data = Vec::with_capacity(total.min(MAX_PREALLOC_BYTES) as usize);

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Download(format!("Body download error: {}", e)))?
        {
            data.extend_from_slice(&chunk);
            if let Some(cb) = on_progress {
                cb(clamp_u32(data.len() as u64), clamp_u32(total));
            }
        }

        if total > 0 && data.len() as u64 != total {
            warn!("Expected {} bytes, received {}", total, data.len());
        }
        Ok(data)
    }

    /// Blocking wrapper around [`OverpassClient::download_async`].
    pub fn download(&self, url: &str, on_progress: Option<&ProgressCallback>) -> Result<Vec<u8>> {
        self.runtime.block_on(self.download_async(url, on_progress))
    }
}

impl PoiSource for OverpassClient {
    fn fetch(&self, query: &str) -> Result<Vec<PoiCandidate>> {
        self.query(query)
    }
}
