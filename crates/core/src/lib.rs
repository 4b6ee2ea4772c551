pub mod config;
pub mod fetch;
pub mod metrics;
pub mod seeder;
pub mod source;
pub mod store;
pub mod sync;
pub mod testing;
pub mod title;
pub mod tsv;
pub mod workspace;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, FetchConfig, LogFormat, SyncConfig,
};
pub use fetch::{
    FetchCompletion, FetchError, FetchOutcome, FetchProgress, Fetcher, HttpFetcher,
    ProgressCallback,
};
pub use seeder::{MappingError, RowError, SeedError, SeedReport, Seeder, TitleMapper};
pub use source::{Source, SourceError, SourceRegistry};
pub use store::{SqliteTitleStore, StoreError, TitleStore, UpsertOutcome};
pub use sync::{CatalogSync, SourceOutcome, SourceReport, SyncError, SyncReport, SyncTotals};
pub use title::{NaturalKey, Region, TitleRecord};
pub use tsv::{read_table, RowMapping, TsvError, TsvReader};
pub use workspace::{version_string, Workspace};
