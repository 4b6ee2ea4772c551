//! Column names of the catalog TSV format.

pub const TITLE_ID: &str = "Title ID";
pub const CONTENT_ID: &str = "Content ID";
pub const REGION: &str = "Region";
pub const NAME: &str = "Name";
pub const LAST_MODIFICATION_DATE: &str = "Last Modification Date";
pub const PKG_DIRECT_LINK: &str = "PKG direct link";
pub const FILE_SIZE: &str = "File Size";
pub const SHA256: &str = "SHA256";
pub const RAP: &str = "RAP";
pub const RAP_FILE_LINK: &str = "Download .RAP file";

/// Columns every catalog row must carry.
pub const REQUIRED: [&str; 10] = [
    TITLE_ID,
    CONTENT_ID,
    REGION,
    NAME,
    LAST_MODIFICATION_DATE,
    PKG_DIRECT_LINK,
    FILE_SIZE,
    SHA256,
    RAP,
    RAP_FILE_LINK,
];
