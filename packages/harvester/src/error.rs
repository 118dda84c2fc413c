//! Error types for the harvester.
//!
//! Malformed fragments and end-of-stream are not errors: the scanner skips
//! the former and ends the sequence on the latter. Everything that reaches
//! this enum is either a configuration mistake or a resource failure.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Tag name that cannot form an opening marker.
    #[error("Invalid tag name: '{0}'. Expected an XML name without spaces or markup (e.g., cv)")]
    InvalidTag(String),

    /// Chunk size of zero characters.
    #[error("Invalid chunk size: {0}. Must be at least 1 character")]
    InvalidChunkSize(usize),

    /// Field path that cannot be resolved against an element.
    #[error("Invalid field path for column '{column}': '{path}'")]
    InvalidFieldPath { column: String, path: String },

    /// Opening marker found but the stream ended before its closing marker.
    ///
    /// Only reported when the scanner runs in strict mode.
    #[error("Truncated <{tag}> element at byte offset {offset}: stream ended before </{tag}>")]
    TruncatedElement { tag: String, offset: u64 },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Field mapping file could not be read.
    #[error("Invalid field mapping: {0}")]
    FieldMap(#[from] serde_yaml_ng::Error),

    /// Malformed delimited input.
    #[error("CSV error at line {line}: {message}")]
    Csv { line: usize, message: String },

    /// Column requested by a statistic is not in the header.
    #[error("Column '{0}' not found in CSV header")]
    MissingColumn(String),

    /// IO error, including invalid UTF-8 in the input stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
