//! Catalog sync runner.
//!
//! For every registered source: refresh the local cache file through a
//! [`Fetcher`](crate::fetch::Fetcher), then parse it and seed the store.
//! Sources run concurrently up to `sync.concurrency`; a failure in one never
//! affects the others.

mod runner;
mod types;

pub use runner::CatalogSync;
pub use types::*;
