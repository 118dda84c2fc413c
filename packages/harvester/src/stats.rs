//! Statistics over harvested CSV files.
//!
//! Rows with any empty field are ignored, matching how the harvested data is
//! analyzed: a record without a job title or a qualification says nothing
//! about either.

use std::collections::HashMap;

use crate::csv::CsvTable;
use crate::error::Result;

/// Number of values reported by [`top_values`] by default.
pub const TOP_N: usize = 5;

/// Lowercase and treat hyphens as spaces, so "Инженер-конструктор" and
/// "инженер конструктор" compare equal.
pub fn normalize(value: &str) -> String {
    value.to_lowercase().replace('-', " ")
}

/// Count complete rows where `left` and `right` differ after [`normalize`].
pub fn count_mismatches(table: &CsvTable, left: &str, right: &str) -> Result<usize> {
    let left = table.column(left)?;
    let right = table.column(right)?;

    Ok(table
        .complete_rows()
        .filter(|row| normalize(&row[left]) != normalize(&row[right]))
        .count())
}

/// Most frequent lowercased `value_column` values among complete rows whose
/// lowercased `search_column` contains `needle`.
///
/// Sorted by count, highest first; ties keep the order of first appearance.
///
/// # Examples
/// ```
/// use cv_harvester::csv::CsvTable;
/// use cv_harvester::stats::top_values;
///
/// let table = CsvTable::parse(
///     "jobTitle,qualification\nМенеджер,Экономист\nменеджер проекта,экономист\nИнженер,Бакалавр\n",
/// )
/// .unwrap();
/// let top = top_values(&table, "jobTitle", "qualification", "менеджер", 5).unwrap();
/// assert_eq!(top, vec![("экономист".to_string(), 2)]);
/// ```
pub fn top_values(
    table: &CsvTable,
    search_column: &str,
    value_column: &str,
    needle: &str,
    n: usize,
) -> Result<Vec<(String, usize)>> {
    let search = table.column(search_column)?;
    let value = table.column(value_column)?;
    let needle = needle.to_lowercase();

    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (order, row) in table
        .complete_rows()
        .filter(|row| row[search].to_lowercase().contains(&needle))
        .enumerate()
    {
        counts
            .entry(row[value].to_lowercase())
            .or_insert((0, order))
            .0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first_seen))| (value, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    Ok(ranked
        .into_iter()
        .take(n)
        .map(|(value, count, _)| (value, count))
        .collect())
}

/// Columns and search strings for a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub left: String,
    pub right: String,
    pub left_search: String,
    pub right_search: String,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            left: "jobTitle".to_string(),
            right: "qualification".to_string(),
            left_search: "менеджер".to_string(),
            right_search: "инженер".to_string(),
        }
    }
}

/// The three figures printed by the `stats` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Complete rows where the two columns differ.
    pub mismatches: usize,
    /// Top `right` values among rows whose `left` contains `left_search`.
    pub right_for_left: Vec<(String, usize)>,
    /// Top `left` values among rows whose `right` contains `right_search`.
    pub left_for_right: Vec<(String, usize)>,
}

impl Report {
    /// Compute all figures for `query`.
    pub fn compute(table: &CsvTable, query: &ReportQuery) -> Result<Self> {
        Ok(Self {
            mismatches: count_mismatches(table, &query.left, &query.right)?,
            right_for_left: top_values(
                table,
                &query.left,
                &query.right,
                &query.left_search,
                TOP_N,
            )?,
            left_for_right: top_values(
                table,
                &query.right,
                &query.left,
                &query.right_search,
                TOP_N,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvesterError;
    use pretty_assertions::assert_eq;

    fn table() -> CsvTable {
        CsvTable::parse(
            "id,jobTitle,qualification\n\
             1,Инженер-конструктор,инженер конструктор\n\
             2,Менеджер,Бакалавр\n\
             3,Менеджер по продажам,менеджер\n\
             4,менеджер,бакалавр\n\
             5,Главный инженер,Инженер\n\
             6,Директор,\n\
             7,Заместитель директора,Инженер-механик\n\
             8,Старший менеджер,Экономист\n",
        )
        .unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Инженер-Конструктор"), "инженер конструктор");
    }

    #[test]
    fn test_count_mismatches_skips_incomplete_rows() {
        // Row 1 matches after normalization, row 6 has an empty field.
        assert_eq!(
            count_mismatches(&table(), "jobTitle", "qualification").unwrap(),
            6
        );
    }

    #[test]
    fn test_top_values_orders_by_count_then_first_seen() {
        let top = top_values(&table(), "jobTitle", "qualification", "МЕНЕДЖЕР", 5).unwrap();
        assert_eq!(
            top,
            vec![
                ("бакалавр".to_string(), 2),
                ("менеджер".to_string(), 1),
                ("экономист".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_top_values_truncates() {
        let top = top_values(&table(), "qualification", "jobTitle", "инженер", 2).unwrap();
        assert_eq!(
            top,
            vec![
                ("инженер-конструктор".to_string(), 1),
                ("главный инженер".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_missing_column() {
        assert!(matches!(
            count_mismatches(&table(), "jobTitle", "salary"),
            Err(HarvesterError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_report() {
        let report = Report::compute(&table(), &ReportQuery::default()).unwrap();
        assert_eq!(report.mismatches, 6);
        assert_eq!(report.right_for_left.len(), 3);
        assert_eq!(report.left_for_right.len(), 3);
    }
}
