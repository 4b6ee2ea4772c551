//! Row to title record mapping.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::columns;
use super::rules::{http_link, LicenseCells};
use super::MappingError;
use crate::title::{Region, TitleRecord};
use crate::tsv::RowMapping;

/// Accepted layouts for "Last Modification Date". `%.f` also matches no fraction.
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps catalog rows to [`TitleRecord`]s.
#[derive(Debug, Clone)]
pub struct TitleMapper {
    required_columns: Vec<String>,
}

impl Default for TitleMapper {
    fn default() -> Self {
        Self::new(columns::REQUIRED)
    }
}

impl TitleMapper {
    /// Create a mapper that rejects rows lacking any of `required_columns`.
    pub fn new<I, S>(required_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_columns: required_columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    /// Map one row. The returned record has no id yet.
    pub fn map(&self, row: &RowMapping) -> Result<TitleRecord, MappingError> {
        if let Some(column) = self
            .required_columns
            .iter()
            .find(|column| !row.contains(column))
        {
            return Err(MappingError::MissingField {
                row: row.row(),
                column: column.clone(),
            });
        }

        let license = LicenseCells::new(
            cell(row, columns::RAP)?,
            cell(row, columns::RAP_FILE_LINK)?,
        );
        let rap = license.rap();
        let rap_file_url = http_link(license.rap_file);
        let is_rap_required = license.is_rap_required(&rap, rap_file_url.as_deref());

        Ok(TitleRecord {
            id: None,
            title_id: cell(row, columns::TITLE_ID)?.to_string(),
            content_id: cell(row, columns::CONTENT_ID)?.to_string(),
            region: parse_region(row)?,
            name: cell(row, columns::NAME)?.to_string(),
            last_modified_date: parse_last_modified(row)?,
            pkg_file_url: http_link(cell(row, columns::PKG_DIRECT_LINK)?),
            pkg_file_size: parse_file_size(row)?,
            pkg_file_hash: cell(row, columns::SHA256)?.to_string(),
            is_license_unlocked_by_dlc: license.is_license_unlocked_by_dlc(),
            is_rap_required,
            rap,
            rap_file_url,
        })
    }
}

fn cell<'a>(row: &'a RowMapping, column: &str) -> Result<&'a str, MappingError> {
    row.get(column).ok_or_else(|| MappingError::MissingField {
        row: row.row(),
        column: column.to_string(),
    })
}

fn parse_region(row: &RowMapping) -> Result<Region, MappingError> {
    let value = cell(row, columns::REGION)?;
    value.parse().map_err(|_| MappingError::InvalidEnum {
        row: row.row(),
        column: columns::REGION.to_string(),
        value: value.to_string(),
    })
}

fn parse_last_modified(row: &RowMapping) -> Result<Option<NaiveDateTime>, MappingError> {
    let value = cell(row, columns::LAST_MODIFICATION_DATE)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    parse_date_time(trimmed)
        .map(Some)
        .ok_or_else(|| MappingError::InvalidDate {
            row: row.row(),
            column: columns::LAST_MODIFICATION_DATE.to_string(),
            value: value.to_string(),
        })
}

fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Sizes are stored as SQLite INTEGER, so anything above `i64::MAX` is rejected.
fn parse_file_size(row: &RowMapping) -> Result<u64, MappingError> {
    let value = cell(row, columns::FILE_SIZE)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    trimmed
        .parse::<i64>()
        .ok()
        .and_then(|size| u64::try_from(size).ok())
        .ok_or_else(|| MappingError::InvalidNumber {
            row: row.row(),
            column: columns::FILE_SIZE.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(overrides: &[(&str, &str)]) -> RowMapping {
        let mut cells = vec![
            (columns::TITLE_ID, "NPEB00001"),
            (columns::CONTENT_ID, "EP0001-NPEB00001_00-GAME000000000000"),
            (columns::REGION, "EU"),
            (columns::NAME, "Test Game"),
            (columns::LAST_MODIFICATION_DATE, "2018-05-14 03:45:28"),
            (columns::PKG_DIRECT_LINK, "http://example.com/x.pkg"),
            (columns::FILE_SIZE, "123456"),
            (columns::SHA256, "ab"),
            (columns::RAP, "0123456789abcdef0123456789abcdef"),
            (columns::RAP_FILE_LINK, ""),
        ];
        for &(column, value) in overrides {
            match cells.iter_mut().find(|cell| cell.0 == column) {
                Some(cell) => cell.1 = value,
                None => cells.push((column, value)),
            }
        }
        RowMapping::from_pairs(1, cells)
    }

    fn without(column: &str) -> RowMapping {
        let row = row_with(&[]);
        RowMapping::from_pairs(
            row.row(),
            row.columns()
                .filter(|c| *c != column)
                .map(|c| (c.to_string(), row.get(c).unwrap_or_default().to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_maps_plain_row() {
        let record = TitleMapper::default().map(&row_with(&[])).unwrap();

        assert_eq!(record.id, None);
        assert_eq!(record.title_id, "NPEB00001");
        assert_eq!(record.content_id, "EP0001-NPEB00001_00-GAME000000000000");
        assert_eq!(record.region, Region::EU);
        assert_eq!(record.name, "Test Game");
        assert_eq!(
            record.last_modified_date,
            NaiveDate::from_ymd_opt(2018, 5, 14).unwrap().and_hms_opt(3, 45, 28)
        );
        assert_eq!(record.pkg_file_url.as_deref(), Some("http://example.com/x.pkg"));
        assert_eq!(record.pkg_file_size, 123456);
        assert_eq!(record.pkg_file_hash, "ab");
        assert_eq!(record.rap, "0123456789abcdef0123456789abcdef");
        assert_eq!(record.rap_file_url, None);
        assert!(record.is_rap_required);
        assert!(!record.is_license_unlocked_by_dlc);
    }

    #[test]
    fn test_not_required_rap() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::RAP, "NOT REQUIRED")]))
            .unwrap();
        assert_eq!(record.rap, "");
        assert!(!record.is_license_unlocked_by_dlc);
        assert!(!record.is_rap_required);
    }

    #[test]
    fn test_unlock_by_dlc_rap() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::RAP, "UNLOCK/LICENSE BY DLC")]))
            .unwrap();
        assert_eq!(record.rap, "");
        assert!(record.is_license_unlocked_by_dlc);
        assert!(!record.is_rap_required);
    }

    #[test]
    fn test_missing_rap_is_required() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::RAP, "MISSING")]))
            .unwrap();
        assert_eq!(record.rap, "");
        assert!(record.is_rap_required);
    }

    #[test]
    fn test_rap_file_link_comes_from_its_own_column() {
        let record = TitleMapper::default()
            .map(&row_with(&[
                (columns::RAP, ""),
                (columns::RAP_FILE_LINK, "http://example.com/x.rap"),
            ]))
            .unwrap();
        assert_eq!(record.rap_file_url.as_deref(), Some("http://example.com/x.rap"));
        assert!(record.is_rap_required);
    }

    #[test]
    fn test_non_http_pkg_link_is_dropped() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::PKG_DIRECT_LINK, "N/A")]))
            .unwrap();
        assert_eq!(record.pkg_file_url, None);
    }

    #[test]
    fn test_empty_file_size_is_zero() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::FILE_SIZE, "")]))
            .unwrap();
        assert_eq!(record.pkg_file_size, 0);
    }

    #[test]
    fn test_bad_file_size_is_invalid_number() {
        for value in ["abc", "-5", "12.5", "18446744073709551615", "9223372036854775808"] {
            let err = TitleMapper::default()
                .map(&row_with(&[(columns::FILE_SIZE, value)]))
                .unwrap_err();
            assert_eq!(
                err,
                MappingError::InvalidNumber {
                    row: 1,
                    column: columns::FILE_SIZE.to_string(),
                    value: value.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_largest_storable_file_size() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::FILE_SIZE, "9223372036854775807")]))
            .unwrap();
        assert_eq!(record.pkg_file_size, i64::MAX as u64);
    }

    #[test]
    fn test_unknown_region_is_invalid_enum() {
        let err = TitleMapper::default()
            .map(&row_with(&[(columns::REGION, "XX")]))
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidEnum { ref value, .. } if value == "XX"));
    }

    #[test]
    fn test_region_is_case_sensitive() {
        let err = TitleMapper::default()
            .map(&row_with(&[(columns::REGION, "eu")]))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_enum");
    }

    #[test]
    fn test_date_formats() {
        let mapper = TitleMapper::default();
        let expected = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

        for value in [
            "2020-01-02 10:11:12",
            "2020-01-02T10:11:12",
            "2020-01-02T10:11:12Z",
            "2020-01-02 10:11:12.500",
        ] {
            let record = mapper
                .map(&row_with(&[(columns::LAST_MODIFICATION_DATE, value)]))
                .unwrap();
            assert_eq!(record.last_modified_date.unwrap().date(), expected, "{value}");
        }

        let record = mapper
            .map(&row_with(&[(columns::LAST_MODIFICATION_DATE, "2020-01-02")]))
            .unwrap();
        assert_eq!(record.last_modified_date, expected.and_hms_opt(0, 0, 0));
    }

    #[test]
    fn test_empty_date_is_absent() {
        let record = TitleMapper::default()
            .map(&row_with(&[(columns::LAST_MODIFICATION_DATE, "")]))
            .unwrap();
        assert_eq!(record.last_modified_date, None);
    }

    #[test]
    fn test_bad_date_is_invalid_date() {
        let err = TitleMapper::default()
            .map(&row_with(&[(columns::LAST_MODIFICATION_DATE, "14/05/2018")]))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_date");
    }

    #[test]
    fn test_missing_required_column() {
        let err = TitleMapper::default().map(&without(columns::SHA256)).unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingField {
                row: 1,
                column: columns::SHA256.to_string(),
            }
        );
    }

    #[test]
    fn test_custom_required_columns() {
        let mapper = TitleMapper::new(["Title ID", "Extra"]);
        let err = mapper.map(&row_with(&[])).unwrap_err();
        assert!(matches!(err, MappingError::MissingField { ref column, .. } if column == "Extra"));

        let record = mapper.map(&row_with(&[("Extra", "1")])).unwrap();
        assert_eq!(record.title_id, "NPEB00001");
    }
}
