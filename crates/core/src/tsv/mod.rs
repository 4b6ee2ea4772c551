//! Tab-separated table reading.
//!
//! Turns a header-first TSV file into a stream of [`RowMapping`]s
//! (column name -> cell value). The reader knows nothing about catalog
//! columns; checking which columns must exist is the seeder's job.

mod reader;
mod types;

pub use reader::{read_table, TsvReader};
pub use types::*;
