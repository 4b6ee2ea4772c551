//! Sync runner implementation.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use super::{SourceOutcome, SourceReport, SyncError, SyncReport};
use crate::config::SyncConfig;
use crate::fetch::{FetchProgress, Fetcher, ProgressCallback};
use crate::metrics;
use crate::seeder::{Seeder, TitleMapper};
use crate::source::{Source, SourceRegistry};
use crate::store::TitleStore;
use crate::workspace::Workspace;

/// Fetches and ingests catalog sources.
pub struct CatalogSync {
    workspace: Workspace,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn TitleStore>,
    mapper: TitleMapper,
    config: SyncConfig,
}

impl CatalogSync {
    pub fn new(
        workspace: Workspace,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn TitleStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            workspace,
            fetcher,
            store,
            mapper: TitleMapper::default(),
            config,
        }
    }

    /// Use a different row mapper.
    pub fn with_mapper(mut self, mapper: TitleMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Sync every source in the registry. Reports come back in registry order.
    ///
    /// Sources share a cache file per type, so only the first source of each
    /// type is synced; later ones are skipped with a warning.
    pub async fn sync_all(&self, registry: &SourceRegistry) -> Result<SyncReport, SyncError> {
        self.workspace.ensure().map_err(|source| SyncError::Workspace {
            path: self.workspace.dir().to_path_buf(),
            source,
        })?;

        let mut seen = HashSet::new();
        let unique = registry
            .iter()
            .filter(|source| {
                let first = seen.insert(source.source_type.as_str());
                if !first {
                    warn!(
                        source_type = %source.source_type,
                        url = %source.source_url,
                        "Skipping duplicate source type"
                    );
                }
                first
            })
            .collect::<Vec<_>>();

        info!(
            sources = unique.len(),
            concurrency = self.config.concurrency,
            skip_fetch = self.config.skip_fetch,
            "Starting catalog sync"
        );

        let sources = stream::iter(unique)
            .map(|source| self.sync_source(source))
            .buffered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let report = SyncReport { sources };
        let totals = report.totals();
        info!(
            sources = totals.sources,
            failed_sources = totals.failed_sources,
            rows = totals.rows,
            inserted = totals.inserted,
            updated = totals.updated,
            failed_rows = totals.failed_rows,
            "Catalog sync finished"
        );
        Ok(report)
    }

    /// Sync only the named sources, in the order given. Repeated names are
    /// synced once.
    pub async fn sync_selected(
        &self,
        registry: &SourceRegistry,
        source_types: &[String],
    ) -> Result<SyncReport, SyncError> {
        let mut seen = HashSet::new();
        let selected = source_types
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .map(|t| {
                registry
                    .get(t)
                    .cloned()
                    .ok_or_else(|| SyncError::UnknownSource(t.clone()))
            })
            .collect::<Result<SourceRegistry, _>>()?;
        self.sync_all(&selected).await
    }

    /// Refresh one source's cache file, then ingest it. A failed fetch skips
    /// ingestion and leaves the previous cache file in place.
    pub async fn sync_source(&self, source: &Source) -> SourceReport {
        if self.config.skip_fetch {
            return self.ingest_cached(source).await;
        }

        let cache_path = self.workspace.cache_path(source);
        info!(source_type = %source.source_type, url = %source.source_url, "Fetching catalog");

        let result = self
            .fetcher
            .fetch(
                &source.source_url,
                &cache_path,
                Some(progress_logger(&source.source_type)),
            )
            .await;

        match result {
            Ok(outcome) => {
                info!(
                    source_type = %source.source_type,
                    bytes = outcome.bytes_written,
                    "Catalog fetched"
                );
                let mut report = self.ingest_cached(source).await;
                report.fetch = Some(outcome);
                report
            }
            Err(e) => {
                error!(source_type = %source.source_type, error = %e, "Failed to fetch catalog");
                metrics::SOURCES_SYNCED
                    .with_label_values(&["fetch_failed"])
                    .inc();
                SourceReport {
                    source_type: source.source_type.clone(),
                    cache_path,
                    fetch: None,
                    outcome: SourceOutcome::FetchFailed(e.to_string()),
                }
            }
        }
    }

    /// Parse and seed the source's existing cache file without fetching.
    pub async fn ingest_cached(&self, source: &Source) -> SourceReport {
        let cache_path = self.workspace.cache_path(source);
        let seeder = Seeder::new(self.store.clone(), self.mapper.clone());
        let source_type = source.source_type.clone();
        let path = cache_path.clone();

        debug!(source_type = %source_type, path = %path.display(), "Ingesting cache file");
        let joined =
            tokio::task::spawn_blocking(move || seeder.seed_file(&source_type, &path)).await;

        let outcome = match joined {
            Ok(Ok(seed)) => SourceOutcome::Ingested(seed),
            Ok(Err(e)) => {
                error!(source_type = %source.source_type, error = %e, "Failed to ingest catalog");
                SourceOutcome::IngestFailed(e.to_string())
            }
            Err(e) => {
                error!(source_type = %source.source_type, error = %e, "Ingest task failed");
                SourceOutcome::IngestFailed(format!("ingest task failed: {e}"))
            }
        };

        if let SourceOutcome::Ingested(seed) = &outcome {
            if !seed.is_success() {
                warn!(
                    source_type = %source.source_type,
                    failed = seed.failed,
                    "Some rows were not ingested"
                );
            }
        }
        metrics::SOURCES_SYNCED
            .with_label_values(&[outcome.as_str()])
            .inc();

        SourceReport {
            source_type: source.source_type.clone(),
            cache_path,
            fetch: None,
            outcome,
        }
    }
}

fn progress_logger(source_type: &str) -> ProgressCallback {
    let source_type = source_type.to_string();
    Arc::new(move |progress: FetchProgress| {
        debug!(
            source_type = %source_type,
            percentage = progress.percentage,
            bytes_received = progress.bytes_received,
            total_bytes = progress.total_bytes,
            average_speed = progress.average_speed,
            "Fetch progress"
        );
    })
}
