//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetch::{FetchError, FetchOutcome, FetchProgress, Fetcher, ProgressCallback};

/// What the mock serves for a URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Write this body to the destination.
    Body(Vec<u8>),
    /// Fail with this HTTP status.
    Status(u16),
}

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub url: String,
    pub destination: PathBuf,
    pub success: bool,
}

/// Mock implementation of the Fetcher trait.
///
/// URLs without a configured response fail with status 404.
///
/// # Example
///
/// ```rust,ignore
/// use nopaystation_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new();
/// fetcher.set_body("http://example.com/PSV_GAMES.tsv", "Title ID\tName\n").await;
/// fetcher.set_status("http://example.com/PSP_GAMES.tsv", 500).await;
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub async fn set_body(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), MockResponse::Body(body.into()));
    }

    /// Fail `url` with an HTTP status.
    pub async fn set_status(&self, url: &str, status: u16) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), MockResponse::Status(status));
    }

    /// Get all recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError> {
        let response = self
            .responses
            .read()
            .await
            .get(url)
            .cloned()
            .unwrap_or(MockResponse::Status(404));

        let result = match response {
            MockResponse::Body(body) => {
                let len = body.len() as u64;
                match tokio::fs::write(destination, body).await {
                    Ok(()) => {
                        if let Some(callback) = progress {
                            callback(FetchProgress::new(len, Some(len), Duration::from_millis(1)));
                        }
                        Ok(FetchOutcome::new(destination, len, Duration::from_millis(1)))
                    }
                    Err(source) => Err(FetchError::Io {
                        path: destination.to_path_buf(),
                        source,
                    }),
                }
            }
            MockResponse::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
        };

        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            success: result.is_ok(),
        });
        result
    }
}
