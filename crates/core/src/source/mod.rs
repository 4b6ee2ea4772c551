//! Remote catalog sources.
//!
//! A [`Source`] pairs a catalog type tag with the URL its TSV file is served
//! from. The set of sources lives in a JSON document handled by
//! [`SourceRegistry`].

mod registry;
mod types;

pub use registry::SourceRegistry;
pub use types::*;
