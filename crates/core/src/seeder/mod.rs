//! Catalog row mapping and seeding.
//!
//! [`TitleMapper`] turns one [`RowMapping`](crate::tsv::RowMapping) into a
//! validated [`TitleRecord`](crate::title::TitleRecord). [`Seeder`] runs the
//! mapper over a whole table and writes each record to a
//! [`TitleStore`](crate::store::TitleStore). A bad row is logged and counted;
//! it never stops the rest of the table.

pub mod columns;
mod mapper;
pub mod rules;
mod runner;
mod types;

pub use mapper::TitleMapper;
pub use runner::Seeder;
pub use types::*;
