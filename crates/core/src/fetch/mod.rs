//! Catalog file transfer.
//!
//! This module provides a `Fetcher` trait for downloading a remote catalog
//! into a local file, with an HTTP implementation on top of `reqwest`.

mod http;
mod types;

pub use http::HttpFetcher;
pub use types::*;
