//! Testing utilities and mock implementations.
//!
//! [`MockFetcher`] stands in for the network so sync runs can be tested
//! against local data only.

mod mock_fetcher;

pub use mock_fetcher::{MockFetcher, MockResponse, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::seeder::columns;

    /// Header line of a catalog file, in the column order catalogs use.
    pub fn catalog_header() -> String {
        [
            columns::TITLE_ID,
            columns::REGION,
            columns::NAME,
            columns::PKG_DIRECT_LINK,
            columns::RAP,
            columns::CONTENT_ID,
            columns::LAST_MODIFICATION_DATE,
            columns::RAP_FILE_LINK,
            columns::FILE_SIZE,
            columns::SHA256,
        ]
        .join("\t")
    }

    /// A valid catalog line matching [`catalog_header`].
    pub fn catalog_line(title_id: &str, region: &str, name: &str, content_id: &str) -> String {
        [
            title_id,
            region,
            name,
            &format!("http://example.com/{title_id}.pkg"),
            "NOT REQUIRED",
            content_id,
            "2020-06-01 10:00:00",
            "",
            "4096",
            "0f0f",
        ]
        .join("\t")
    }

    /// A whole catalog file: header plus `lines`, newline terminated.
    pub fn catalog(lines: &[String]) -> String {
        let mut out = catalog_header();
        out.push('\n');
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
