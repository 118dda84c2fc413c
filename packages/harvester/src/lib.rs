//! CV Harvester - Stream complete elements out of very large XML dumps.
//!
//! The core is [`scanner::ChunkedTagScanner`], which reads a document in
//! fixed-size chunks and yields every complete `<tag ...>...</tag>` element
//! as a parsed tree without loading the whole file. Around it sit the
//! pieces that turn those elements into a sampled CSV file and summarize it.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use cv_harvester::scanner::ChunkedTagScanner;
//! use cv_harvester::source::Utf8Source;
//!
//! let xml = r#"<cvs><cv id="1"><x>a</x></cv><cv id="2"><x>b</x></cv></cvs>"#;
//! let scanner = ChunkedTagScanner::new(Utf8Source::new(Cursor::new(xml)), "cv").unwrap();
//! assert_eq!(scanner.count(), 2);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and validation
//! - [`error`]: Error types and Result alias
//! - [`source`]: Character sources read in chunks
//! - [`scanner`]: Chunked tag scanner
//! - [`xml`]: Owned element trees and path navigation
//! - [`record`]: Field mappings and flat records
//! - [`sample`]: Random record sampling
//! - [`csv`]: Delimited output and input
//! - [`stats`]: Statistics over harvested CSV files
//! - [`harvester`]: Scan, project, sample and write in one run
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod csv;
pub mod error;
pub mod harvester;
pub mod record;
pub mod sample;
pub mod scanner;
pub mod source;
pub mod stats;
pub mod xml;

// Re-export main functions
pub use harvester::{harvest, harvest_file};

// Re-export commonly used items
pub use error::{HarvesterError, Result};
pub use record::{FieldMap, Record};
pub use scanner::{ChunkedTagScanner, MatchMode, ScanOptions, ScanStats};
pub use xml::Element;
