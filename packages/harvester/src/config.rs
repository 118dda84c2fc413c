//! Configuration constants and validation functions for the harvester.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{HarvesterError, Result};

/// Tag extracted when none is given on the command line.
pub const DEFAULT_TAG: &str = "cv";

/// Default number of characters pulled from the input per read (1 MiB).
///
/// Large enough that a typical record fits in one or two chunks, small enough
/// that multi-gigabyte dumps never have to be held in memory.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default sampling rate: one record kept per `DEFAULT_SAMPLE_RATE + 1`.
pub const DEFAULT_SAMPLE_RATE: u32 = 100;

/// Default CSV output file.
pub const DEFAULT_OUTPUT: &str = "works.csv";

/// Default field mapping for CV dumps: `(column, path)` in header order.
pub const DEFAULT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("jobTitle", "workExperienceList/workExperience/jobTitle"),
    ("qualification", "educationList/educationType/qualification"),
    ("positionName", "positionName"),
    ("salary", "salary"),
    ("localityName", "localityName"),
];

/// Tag name pattern: an XML name without namespace prefix.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").expect("valid regex"));

/// Validate a target tag name.
///
/// The name ends up inside the literal markers `<tag ` and `</tag>`, so it
/// must not contain whitespace, markup or a namespace prefix.
///
/// # Examples
/// ```
/// use cv_harvester::config::validate_tag;
///
/// assert!(validate_tag("cv").is_ok());
/// assert!(validate_tag("work-experience").is_ok());
/// assert!(validate_tag("").is_err());
/// assert!(validate_tag("ns:cv").is_err());
/// ```
pub fn validate_tag(tag: &str) -> Result<()> {
    if TAG_PATTERN.is_match(tag) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidTag(tag.to_string()))
    }
}

/// Validate a chunk size in characters.
///
/// # Examples
/// ```
/// use cv_harvester::config::validate_chunk_size;
///
/// assert!(validate_chunk_size(1).is_ok());
/// assert!(validate_chunk_size(0).is_err());
/// ```
pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        Err(HarvesterError::InvalidChunkSize(chunk_size))
    } else {
        Ok(())
    }
}

/// Build the opening marker for a tag (`<tag `).
pub fn opening_marker(tag: &str) -> String {
    format!("<{tag} ")
}

/// Build the closing marker for a tag (`</tag>`).
pub fn closing_marker(tag: &str) -> String {
    format!("</{tag}>")
}
