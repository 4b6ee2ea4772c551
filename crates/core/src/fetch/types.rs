//! Types for catalog fetching.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not an HTTP URL: {0:?}")]
    InvalidUrl(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(e.to_string())
        }
    }
}

/// Progress of a running transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FetchProgress {
    /// 0 to 100. Stays at 0 while the total size is unknown.
    pub percentage: f64,
    pub bytes_received: u64,
    /// Content-Length, when the server sent one.
    pub total_bytes: Option<u64>,
    /// Bytes per second since the transfer started.
    pub average_speed: f64,
}

impl FetchProgress {
    pub fn new(bytes_received: u64, total_bytes: Option<u64>, elapsed: Duration) -> Self {
        let percentage = match total_bytes {
            Some(0) => 100.0,
            Some(total) => (bytes_received as f64 / total as f64 * 100.0).min(100.0),
            None => 0.0,
        };
        Self {
            percentage,
            bytes_received,
            total_bytes,
            average_speed: average_speed(bytes_received, elapsed),
        }
    }
}

/// Callback for progress notifications.
pub type ProgressCallback = Arc<dyn Fn(FetchProgress) + Send + Sync>;

/// A finished transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub destination: PathBuf,
    pub bytes_written: u64,
    pub elapsed: Duration,
    pub average_speed: f64,
}

impl FetchOutcome {
    pub fn new(destination: &Path, bytes_written: u64, elapsed: Duration) -> Self {
        Self {
            destination: destination.to_path_buf(),
            bytes_written,
            elapsed,
            average_speed: average_speed(bytes_written, elapsed),
        }
    }
}

/// Terminal notification of a fetch: success, or the error that ended it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCompletion {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<FetchOutcome, FetchError>> for FetchCompletion {
    fn from(result: &Result<FetchOutcome, FetchError>) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

fn average_speed(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 / secs
    } else {
        0.0
    }
}

/// Trait for catalog transfer backends.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Download `url` into `destination`.
    ///
    /// `progress` is called zero or more times while the transfer runs. The
    /// returned value is the single terminal notification. On failure the
    /// previous contents of `destination` are left untouched.
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError>;
}
