//! Join lookup results back onto the input rows.
//!
//! The identifier column is found by a linear scan over the header for the
//! first name containing `DOI` (case-insensitive). The `Created Date`
//! column is always appended last, replacing any earlier one, and rows are
//! then stably sorted by it: empty cells first, then cells that are not a
//! date (such as `Error`), then dates ascending.

use crate::batch::DateMap;
use crate::crossref::is_placeholder;
use crate::date::PartialDate;
use crate::error::{DoiDatesError, Result};
use crate::table::{Cell, Table};

/// Token searched for in column names
pub const IDENTIFIER_TOKEN: &str = "DOI";

/// Name of the appended result column
pub const CREATED_DATE_COLUMN: &str = "Created Date";

/// First column whose name contains `DOI`, ignoring case
pub fn find_identifier_column(columns: &[String]) -> Result<&str> {
    columns
        .iter()
        .find(|c| c.to_uppercase().contains(IDENTIFIER_TOKEN))
        .map(String::as_str)
        .ok_or_else(|| DoiDatesError::ColumnNotFound {
            token: IDENTIFIER_TOKEN.to_string(),
        })
}

/// Stringified identifiers of one column, skipping missing and placeholder cells.
/// Duplicates are kept.
pub fn collect_identifiers(table: &Table, identifier_column: &str) -> Result<Vec<String>> {
    let index = column_index(table, identifier_column)?;
    Ok(table
        .column_values(index)
        .filter_map(Cell::as_key)
        .filter(|doi| !is_placeholder(doi))
        .collect())
}

/// Ordering key for the `Created Date` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Missing,
    Unparsed,
    Dated(PartialDate),
}

pub fn sort_key(cell: Option<&Cell>) -> SortKey {
    match cell.and_then(Cell::as_key) {
        None => SortKey::Missing,
        Some(text) => PartialDate::parse(&text).map_or(SortKey::Unparsed, SortKey::Dated),
    }
}

/// Append `Created Date` from `dates` and sort rows by it.
///
/// Rows whose identifier is absent from `dates` get an empty cell.
pub fn merge_dates(mut table: Table, identifier_column: &str, dates: &DateMap) -> Result<Table> {
    let index = column_index(&table, identifier_column)?;

    let created: Vec<Cell> = table
        .column_values(index)
        .map(|cell| {
            cell.as_key()
                .and_then(|doi| dates.get(&doi))
                .map_or(Cell::Missing, |date| Cell::Text(date.to_string()))
        })
        .collect();

    table.remove_column(CREATED_DATE_COLUMN);
    table.push_column(CREATED_DATE_COLUMN, created);

    let date_index = table.columns().len() - 1;
    table.sort_rows_by_key(|row| sort_key(row.get(date_index)));

    Ok(table)
}

fn column_index(table: &Table, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| DoiDatesError::ColumnNotFound {
            token: column.to_string(),
        })
}
