//! License derivation rules.
//!
//! Catalogs put sentinel strings in the "RAP" and "Download .RAP file"
//! columns instead of real values. The rules below decide what those
//! sentinels mean for the stored record.

/// Sentinel values seen in the license columns. Matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    NotRequired,
    UnlockedByDlc,
    Missing,
}

impl Sentinel {
    pub const ALL: [Sentinel; 3] = [
        Sentinel::NotRequired,
        Sentinel::UnlockedByDlc,
        Sentinel::Missing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::NotRequired => "NOT REQUIRED",
            Sentinel::UnlockedByDlc => "UNLOCK/LICENSE BY DLC",
            Sentinel::Missing => "MISSING",
        }
    }

    /// The sentinel a cell holds, if any.
    pub fn of(cell: &str) -> Option<Sentinel> {
        Sentinel::ALL.into_iter().find(|s| s.as_str() == cell)
    }
}

/// Whether a license is required when either license cell holds the sentinel.
/// Checked top to bottom; the first sentinel present in either cell decides.
const RAP_REQUIRED_RULES: [(Sentinel, bool); 3] = [
    (Sentinel::Missing, true),
    (Sentinel::NotRequired, false),
    (Sentinel::UnlockedByDlc, false),
];

/// The two license cells of a catalog row.
#[derive(Debug, Clone, Copy)]
pub struct LicenseCells<'a> {
    pub rap: &'a str,
    pub rap_file: &'a str,
}

impl<'a> LicenseCells<'a> {
    pub fn new(rap: &'a str, rap_file: &'a str) -> Self {
        Self { rap, rap_file }
    }

    fn holds(&self, sentinel: Sentinel) -> bool {
        Sentinel::of(self.rap) == Some(sentinel) || Sentinel::of(self.rap_file) == Some(sentinel)
    }

    /// License key to store: the RAP cell, or empty when it is a sentinel.
    pub fn rap(&self) -> String {
        match Sentinel::of(self.rap) {
            Some(_) => String::new(),
            None => self.rap.to_string(),
        }
    }

    /// `rap` and `rap_file_url` are the values already derived for the record.
    pub fn is_rap_required(&self, rap: &str, rap_file_url: Option<&str>) -> bool {
        RAP_REQUIRED_RULES
            .iter()
            .find(|(sentinel, _)| self.holds(*sentinel))
            .map(|(_, required)| *required)
            .unwrap_or_else(|| !rap.is_empty() || rap_file_url.is_some())
    }

    pub fn is_license_unlocked_by_dlc(&self) -> bool {
        self.holds(Sentinel::UnlockedByDlc)
    }
}

/// Keep a link cell only if it looks like an HTTP URL.
///
/// This is a substring check, not URL validation.
pub fn http_link(cell: &str) -> Option<String> {
    cell.contains("http").then(|| cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAP_KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sentinel_match_is_exact() {
        assert_eq!(Sentinel::of("MISSING"), Some(Sentinel::Missing));
        assert_eq!(Sentinel::of("missing"), None);
        assert_eq!(Sentinel::of(" MISSING"), None);
        assert_eq!(Sentinel::of(""), None);
    }

    #[test]
    fn test_sentinel_rap_is_cleared() {
        for sentinel in Sentinel::ALL {
            assert_eq!(LicenseCells::new(sentinel.as_str(), "").rap(), "");
        }
        assert_eq!(LicenseCells::new(RAP_KEY, "").rap(), RAP_KEY);
    }

    #[test]
    fn test_missing_wins_over_other_sentinels() {
        let cells = LicenseCells::new("NOT REQUIRED", "MISSING");
        assert!(cells.is_rap_required("", None));

        let cells = LicenseCells::new("MISSING", "UNLOCK/LICENSE BY DLC");
        assert!(cells.is_rap_required("", None));
    }

    #[test]
    fn test_not_required_and_dlc_are_not_required() {
        assert!(!LicenseCells::new("NOT REQUIRED", "").is_rap_required("", None));
        assert!(!LicenseCells::new("", "UNLOCK/LICENSE BY DLC").is_rap_required("", None));
        // A sentinel decides even if a file link is present.
        assert!(!LicenseCells::new("NOT REQUIRED", "http://x/y.rap")
            .is_rap_required("", Some("http://x/y.rap")));
    }

    #[test]
    fn test_without_sentinel_depends_on_derived_values() {
        let cells = LicenseCells::new(RAP_KEY, "");
        assert!(cells.is_rap_required(RAP_KEY, None));

        let cells = LicenseCells::new("", "http://example.com/a.rap");
        assert!(cells.is_rap_required("", Some("http://example.com/a.rap")));

        let cells = LicenseCells::new("", "");
        assert!(!cells.is_rap_required("", None));
    }

    #[test]
    fn test_unlocked_by_dlc_from_either_cell() {
        assert!(LicenseCells::new("UNLOCK/LICENSE BY DLC", "").is_license_unlocked_by_dlc());
        assert!(LicenseCells::new("", "UNLOCK/LICENSE BY DLC").is_license_unlocked_by_dlc());
        assert!(!LicenseCells::new("NOT REQUIRED", "MISSING").is_license_unlocked_by_dlc());
    }

    #[test]
    fn test_http_link() {
        assert_eq!(
            http_link("http://example.com/x.pkg").as_deref(),
            Some("http://example.com/x.pkg")
        );
        assert_eq!(
            http_link("https://example.com/x.pkg").as_deref(),
            Some("https://example.com/x.pkg")
        );
        assert_eq!(http_link("N/A"), None);
        assert_eq!(http_link("MISSING"), None);
        assert_eq!(http_link(""), None);
    }
}
