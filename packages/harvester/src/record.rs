//! Field mappings and flat records.
//!
//! A [`FieldMap`] names the CSV columns and the element path each column is
//! read from. Projecting an [`Element`] through it gives a [`Record`] with
//! one value per column, empty where the path matches nothing.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::DEFAULT_FIELDS;
use crate::error::{HarvesterError, Result};
use crate::xml::{find_text, Element, ElementPath};

/// One column of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    column: String,
    path: ElementPath,
}

impl Field {
    /// Column name used in the header.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Path resolved against each element.
    pub fn path(&self) -> &ElementPath {
        &self.path
    }
}

/// Ordered `column -> path` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<Field>,
}

/// Field mapping file layout.
///
/// ```yaml
/// tag: cv
/// fields:
///   - column: jobTitle
///     path: workExperienceList/workExperience/jobTitle
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MappingFile {
    /// Tag to extract; the command line wins when both are given.
    #[serde(default)]
    tag: Option<String>,
    fields: Vec<FieldSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSpec {
    column: String,
    path: String,
}

impl FieldMap {
    /// Build a mapping from `(column, path)` pairs.
    ///
    /// # Arguments
    /// * `pairs` - Column name and element path, in header order
    ///
    /// # Returns
    /// The mapping, or [`HarvesterError::InvalidFieldPath`] naming the first
    /// column whose path does not parse
    ///
    /// # Examples
    /// ```
    /// use cv_harvester::record::FieldMap;
    ///
    /// let fields = FieldMap::new([("title", "kop/titel"), ("nr", ".//nr")]).unwrap();
    /// assert_eq!(fields.header(), vec!["title", "nr"]);
    ///
    /// assert!(FieldMap::new([("bad", "/absolute")]).is_err());
    /// ```
    pub fn new<I, C, P>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, P)>,
        C: Into<String>,
        P: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(column, path)| {
                let column = column.into();
                let path = path.as_ref();
                match ElementPath::parse(path) {
                    Some(path) => Ok(Field { column, path }),
                    None => Err(HarvesterError::InvalidFieldPath {
                        column,
                        path: path.to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// Built-in mapping for CV dumps.
    pub fn cv_default() -> Result<Self> {
        Self::new(DEFAULT_FIELDS.iter().copied())
    }

    /// Parse a YAML mapping file, returning the mapping and the tag it names.
    ///
    /// # Arguments
    /// * `yaml` - Mapping document with `fields` and an optional `tag`
    ///
    /// # Returns
    /// The mapping and the tag, `None` when the file does not set one
    pub fn from_yaml_str(yaml: &str) -> Result<(Self, Option<String>)> {
        let file: MappingFile = serde_yaml_ng::from_str(yaml)?;
        let fields = Self::new(file.fields.into_iter().map(|f| (f.column, f.path)))?;
        Ok((fields, file.tag))
    }

    /// Read a YAML mapping file from disk.
    pub fn from_yaml_file(path: &Path) -> Result<(Self, Option<String>)> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Columns in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Header row.
    pub fn header(&self) -> Vec<&str> {
        self.fields.iter().map(Field::column).collect()
    }

    /// Project an element into a record.
    ///
    /// # Arguments
    /// * `element` - Parsed element whose root the paths start from
    ///
    /// # Returns
    /// One trimmed value per column; `""` where a path matches nothing
    pub fn extract(&self, element: &Element) -> Record {
        Record {
            values: self
                .fields
                .iter()
                .map(|field| find_text(element.root(), &field.path))
                .collect(),
        }
    }
}

/// Flat row of field values, in mapping order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    /// Values in column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value of column `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}
