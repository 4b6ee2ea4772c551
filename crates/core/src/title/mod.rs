//! Title records - the persisted catalog entity.

mod types;

pub use types::*;
