//! HTTP fetcher.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{FetchError, FetchOutcome, FetchProgress, Fetcher, ProgressCallback};
use crate::config::FetchConfig;
use crate::metrics;

/// Downloads catalogs over HTTP(S).
///
/// The body is streamed into `<destination>.part` and renamed over the
/// destination once complete.
pub struct HttpFetcher {
    client: Client,
    max_bytes_per_second: u64,
    progress_interval: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            max_bytes_per_second: config.max_bytes_per_second,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
        })
    }

    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        part: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError> {
        let started = Instant::now();
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let total = response.content_length();

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(parent))?;
        }
        let mut file = File::create(part).await.map_err(io_error(part))?;

        let mut received: u64 = 0;
        let mut last_report = Instant::now();
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_error(part))?;
            received += chunk.len() as u64;

            if let Some(callback) = progress {
                if last_report.elapsed() >= self.progress_interval {
                    callback(FetchProgress::new(received, total, started.elapsed()));
                    last_report = Instant::now();
                }
            }

            self.throttle(received, started).await;
        }

        file.flush().await.map_err(io_error(part))?;
        drop(file);
        tokio::fs::rename(part, destination)
            .await
            .map_err(io_error(destination))?;

        let elapsed = started.elapsed();
        if let Some(callback) = progress {
            callback(FetchProgress::new(received, total.or(Some(received)), elapsed));
        }
        Ok(FetchOutcome::new(destination, received, elapsed))
    }

    // Sleep until the average rate is back under the limit.
    async fn throttle(&self, received: u64, started: Instant) {
        if self.max_bytes_per_second == 0 {
            return;
        }
        let due = Duration::from_secs_f64(received as f64 / self.max_bytes_per_second as f64);
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError> {
        if !url.contains("http") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        debug!(url = %url, destination = %destination.display(), "Starting fetch");
        let part = part_path(destination);
        let started = Instant::now();
        let result = self
            .transfer(url, destination, &part, progress.as_ref())
            .await;

        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::FETCHES_TOTAL.with_label_values(&[label]).inc();
        metrics::FETCH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                metrics::BYTES_FETCHED.inc_by(outcome.bytes_written);
                debug!(
                    url = %url,
                    bytes = outcome.bytes_written,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Fetch complete"
                );
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&part).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %part.display(), error = %remove_err, "Failed to remove partial file");
                    }
                }
                warn!(url = %url, error = %e, "Fetch failed");
            }
        }

        result
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> FetchError + '_ {
    move |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}
