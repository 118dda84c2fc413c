//! Delimited output and input.
//!
//! [`CsvWriter`] appends rows to a file, writing the header only when the
//! file starts out empty. [`CsvTable`] reads a whole CSV file for the
//! statistics in [`crate::stats`].

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{HarvesterError, Result};
use crate::record::Record;

/// Field delimiter.
pub const DELIMITER: char = ',';

const QUOTE: char = '"';

/// Row writer.
#[derive(Debug)]
pub struct CsvWriter<W: Write> {
    writer: W,
    rows_written: u64,
}

impl CsvWriter<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    ///
    /// The header is written when the file is new or empty.
    ///
    /// # Arguments
    /// * `path` - CSV file to append to
    /// * `header` - Column names, used only for a new or empty file
    ///
    /// # Returns
    /// A buffered writer positioned at the end of the file
    pub fn append(path: &Path, header: &[&str]) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = Self::new(BufWriter::new(file));
        if is_empty {
            writer.write_row(header)?;
            writer.rows_written = 0;
        }
        Ok(writer)
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            rows_written: 0,
        }
    }

    /// Write one row.
    ///
    /// A row made of a single empty field is written as `""` so it does not
    /// read back as a blank line.
    ///
    /// # Arguments
    /// * `fields` - Field values in column order; escaped as needed
    ///
    /// # Returns
    /// `Ok(())`, or the I/O error from the underlying writer
    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let line = match fields {
            [only] if only.as_ref().is_empty() => format!("{QUOTE}{QUOTE}"),
            _ => fields
                .iter()
                .map(|f| escape_field(f.as_ref()))
                .collect::<Vec<_>>()
                .join(DELIMITER.to_string().as_str()),
        };
        writeln!(self.writer, "{line}")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write one record.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        self.write_row(record.values())
    }

    /// Rows written through this writer. The header written by
    /// [`CsvWriter::append`] is not counted.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and give back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn escape_field(value: &str) -> String {
    if value.contains(DELIMITER)
        || value.contains(QUOTE)
        || value.contains('\n')
        || value.contains('\r')
    {
        let escaped = value.replace(QUOTE, "\"\"");
        format!("{QUOTE}{escaped}{QUOTE}")
    } else {
        value.to_string()
    }
}

/// A parsed CSV file: header plus rows, each row padded to the header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Read a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse CSV text. Blank lines are skipped; short rows are padded with
    /// empty fields; rows wider than the header are an error.
    ///
    /// # Examples
    /// ```
    /// use cv_harvester::csv::CsvTable;
    ///
    /// let table = CsvTable::parse("a,b\n1,\"x, y\"\n").unwrap();
    /// assert_eq!(table.header(), &["a", "b"]);
    /// assert_eq!(table.rows()[0], vec!["1", "x, y"]);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let mut records = parse_records(content)?.into_iter();
        let Some((_, header)) = records.next() else {
            return Ok(Self {
                header: Vec::new(),
                rows: Vec::new(),
            });
        };

        let mut rows = Vec::new();
        for (line, mut row) in records {
            if row.len() > header.len() {
                return Err(HarvesterError::Csv {
                    line,
                    message: format!(
                        "expected {} fields, found {}",
                        header.len(),
                        row.len()
                    ),
                });
            }
            row.resize(header.len(), String::new());
            rows.push(row);
        }

        Ok(Self { header, rows })
    }

    /// Column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// All data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of a column by name.
    ///
    /// # Returns
    /// Position in the header, or [`HarvesterError::MissingColumn`]
    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| HarvesterError::MissingColumn(name.to_string()))
    }

    /// Rows in which every field is non-empty.
    pub fn complete_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows
            .iter()
            .filter(|row| row.iter().all(|field| !field.is_empty()))
    }
}

/// Split CSV text into records, each tagged with the line it starts on.
fn parse_records(content: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Set once the current field opened a quote, so `""` alone is a row.
    let mut quoted = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            QUOTE if field.is_empty() => {
                in_quotes = true;
                quoted = true;
            }
            DELIMITER => {
                row.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_row(&mut records, &mut row, &mut field, quoted, row_line);
                quoted = false;
                line += 1;
                row_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(HarvesterError::Csv {
            line: row_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    finish_row(&mut records, &mut row, &mut field, quoted, row_line);

    Ok(records)
}

fn finish_row(
    records: &mut Vec<(usize, Vec<String>)>,
    row: &mut Vec<String>,
    field: &mut String,
    quoted: bool,
    line: usize,
) {
    if row.is_empty() && field.is_empty() && !quoted {
        return;
    }
    row.push(std::mem::take(field));
    records.push((line, std::mem::take(row)));
}
