//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use nopaystation_core::{
    metrics, CatalogSync, Config, HttpFetcher, Region, SeedReport, Seeder, Source,
    SourceOutcome, SourceRegistry, SqliteTitleStore, SyncReport, TitleStore, Workspace,
};

use crate::cli::{SourcesCommand, SyncArgs, TitlesCommand};

/// Everything a command needs, built from the loaded configuration.
pub struct AppContext {
    pub config: Config,
    pub workspace: Workspace,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let workspace = config.workspace();
        workspace.ensure().with_context(|| {
            format!(
                "Failed to create working directory {}",
                workspace.dir().display()
            )
        })?;
        Ok(Self { config, workspace })
    }

    fn open_store(&self) -> Result<Arc<SqliteTitleStore>> {
        let path = self.config.database_path(&self.workspace);
        let store = SqliteTitleStore::new(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Ok(Arc::new(store))
    }

    fn load_registry(&self) -> Result<SourceRegistry> {
        let path = self.config.registry_path(&self.workspace);
        SourceRegistry::from_file(&path)
            .with_context(|| format!("Failed to load source registry {}", path.display()))
    }

    fn load_registry_or_empty(&self) -> Result<SourceRegistry> {
        let path = self.config.registry_path(&self.workspace);
        if !path.exists() {
            info!(path = %path.display(), "No source registry yet");
            return Ok(SourceRegistry::default());
        }
        self.load_registry()
    }

    fn save_registry(&self, registry: &SourceRegistry) -> Result<()> {
        let path = self.config.registry_path(&self.workspace);
        registry
            .save(&path)
            .with_context(|| format!("Failed to save source registry {}", path.display()))
    }
}

/// Returns whether every source ingested cleanly.
pub async fn run_sync(ctx: &AppContext, args: &SyncArgs) -> Result<bool> {
    let registry = ctx.load_registry()?;
    let store = ctx.open_store()?;
    let fetcher = HttpFetcher::new(&ctx.config.fetch).context("Failed to create HTTP client")?;

    let mut sync_config = ctx.config.sync.clone();
    sync_config.skip_fetch |= args.skip_fetch;

    let sync = CatalogSync::new(
        ctx.workspace.clone(),
        Arc::new(fetcher),
        store,
        sync_config,
    );
    let report = if args.sources.is_empty() {
        sync.sync_all(&registry).await?
    } else {
        sync.sync_selected(&registry, &args.sources).await?
    };

    print_sync_report(&report);

    if let Some(path) = &args.metrics_out {
        write_metrics(path)?;
    }

    Ok(report.is_success())
}

/// Returns whether every row ingested cleanly.
pub fn run_ingest(ctx: &AppContext, source_type: &str, file: &Path) -> Result<bool> {
    let store = ctx.open_store()?;
    let seeder = Seeder::with_default_mapper(store);
    let report = seeder
        .seed_file(source_type, file)
        .with_context(|| format!("Failed to ingest {}", file.display()))?;

    print_seed_report(&report);
    Ok(report.is_success())
}

pub fn run_sources(ctx: &AppContext, command: &SourcesCommand) -> Result<()> {
    match command {
        SourcesCommand::List => {
            let registry = ctx.load_registry_or_empty()?;
            for source in &registry {
                println!("{}\t{}", source.source_type, source.source_url);
            }
        }
        SourcesCommand::Add { source_type, url } => {
            let source = Source::new(source_type.clone(), url.clone());
            if !source.has_http_scheme() {
                warn!(url = %url, "Source URL has no http scheme; fetches will fail");
            }
            let mut registry = ctx.load_registry_or_empty()?;
            match registry.insert(source) {
                Some(old) => println!("Replaced {old}"),
                None => println!("Added {source_type}"),
            }
            ctx.save_registry(&registry)?;
        }
        SourcesCommand::Remove { source_type } => {
            let mut registry = ctx.load_registry()?;
            registry
                .remove(source_type)
                .with_context(|| format!("No source named {source_type}"))?;
            ctx.save_registry(&registry)?;
            println!("Removed {source_type}");
        }
    }
    Ok(())
}

pub fn run_titles(ctx: &AppContext, command: &TitlesCommand) -> Result<()> {
    let store = ctx.open_store()?;
    match command {
        TitlesCommand::List { region } => {
            let titles = store.query_all().context("Failed to query titles")?;
            for title in titles.iter().filter(|t| matches_region(t.region, *region)) {
                println!("{title}");
            }
        }
        TitlesCommand::Count => {
            println!("{}", store.count().context("Failed to count titles")?);
        }
    }
    Ok(())
}

fn matches_region(region: Region, filter: Option<Region>) -> bool {
    filter.is_none_or(|f| f == region)
}

fn write_metrics(path: &Path) -> Result<()> {
    let text = metrics::encode_metrics().context("Failed to encode metrics")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write metrics to {}", path.display()))
}

fn print_seed_report(report: &SeedReport) {
    println!(
        "{}: {} rows, {} inserted, {} updated, {} failed",
        report.source_type, report.total, report.inserted, report.updated, report.failed
    );
    for failure in &report.failures {
        println!("  row {}: {}", failure.row, failure.error);
    }
}

fn print_sync_report(report: &SyncReport) {
    for source in &report.sources {
        match &source.outcome {
            SourceOutcome::Ingested(seed) => print_seed_report(seed),
            SourceOutcome::FetchFailed(e) => println!("{}: fetch failed: {e}", source.source_type),
            SourceOutcome::IngestFailed(e) => {
                println!("{}: ingest failed: {e}", source.source_type)
            }
        }
    }

    let totals = report.totals();
    println!(
        "{} sources ({} failed): {} rows, {} inserted, {} updated, {} failed",
        totals.sources,
        totals.failed_sources,
        totals.rows,
        totals.inserted,
        totals.updated,
        totals.failed_rows
    );
}
