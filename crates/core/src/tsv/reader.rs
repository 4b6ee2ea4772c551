//! Streaming TSV reader.

use std::fs::File;
use std::io::Read;
use std::iter::FusedIterator;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use super::{RowMapping, TsvError};

const FIELD_SEPARATOR: u8 = b'\t';
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Lazy, single-pass reader over a header-first TSV table.
///
/// The header is read eagerly by the constructor; every call to `next()`
/// consumes one record and yields one row. Quotes carry no meaning. A blank
/// line ends the table. The first error ends iteration.
pub struct TsvReader<R> {
    reader: csv::Reader<R>,
    header: Vec<String>,
    record: StringRecord,
    /// Physical line number of the last consumed line.
    line_number: u64,
    rows_read: usize,
    finished: bool,
}

impl TsvReader<File> {
    /// Open a TSV file and read its header.
    pub fn open(path: &Path) -> Result<Self, TsvError> {
        let file = File::open(path).map_err(|source| TsvError::Open {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Opened TSV table");
        Self::from_reader(file)
    }
}

impl<R: Read> TsvReader<R> {
    /// Read the header from any reader.
    pub fn from_reader(reader: R) -> Result<Self, TsvError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(FIELD_SEPARATOR)
            .quoting(false)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?;
        if headers.is_empty() {
            return Err(TsvError::MissingHeader);
        }
        let header = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if idx == 0 {
                    name.trim_start_matches(BYTE_ORDER_MARK)
                } else {
                    name
                }
            })
            .map(str::to_string)
            .collect::<Vec<_>>();

        Ok(Self {
            reader,
            header,
            record: StringRecord::new(),
            line_number: 1,
            rows_read: 0,
            finished: false,
        })
    }

    /// Column names in encounter order (duplicates kept).
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// The csv reader skips empty lines. Each record spans one line, so a
    /// record that starts past the next line, or that consumed more than one
    /// line, had blank lines in front of it.
    fn follows_blank_line(&self, start_line: u64) -> bool {
        let end_line = self.reader.position().line();
        start_line > self.line_number + 1 || end_line.saturating_sub(start_line) > 1
    }

    fn parse_record(&mut self) -> Result<RowMapping, TsvError> {
        if self.record.len() != self.header.len() {
            return Err(TsvError::MalformedRow {
                line: self.line_number as usize,
                expected: self.header.len(),
                actual: self.record.len(),
            });
        }

        self.rows_read += 1;
        Ok(RowMapping::from_pairs(
            self.rows_read,
            self.header.iter().map(String::as_str).zip(self.record.iter()),
        ))
    }
}

impl<R: Read> Iterator for TsvReader<R> {
    type Item = Result<RowMapping, TsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let start_line = self.reader.position().line();
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(e) => {
                self.finished = true;
                return Some(Err(e.into()));
            }
        }

        let start_line = self
            .record
            .position()
            .map_or(start_line, |pos| pos.line().max(start_line));
        if self.follows_blank_line(start_line) {
            self.finished = true;
            return None;
        }
        self.line_number += 1;

        let result = self.parse_record();
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

impl<R: Read> FusedIterator for TsvReader<R> {}

/// Read a whole table. Fails on the first bad line; no partial table is returned.
pub fn read_table(path: &Path) -> Result<Vec<RowMapping>, TsvError> {
    let rows = TsvReader::open(path)?.collect::<Result<Vec<_>, _>>()?;
    debug!(path = %path.display(), rows = rows.len(), "Read TSV table");
    Ok(rows)
}
