//! CSV import/export for [`Table`]s.

use crate::error::{DoiDatesError, Result};
use crate::table::{Cell, Table};
use chrono::{DateTime, TimeZone};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Downloadable artifacts produced by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Full,
    Filtered,
}

impl Artifact {
    /// `doi_dates_{full|filtered}_YYYYmmdd_HHMMSS.csv`
    pub fn file_name<Tz>(&self, at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let kind = match self {
            Self::Full => "full",
            Self::Filtered => "filtered",
        };
        format!("doi_dates_{}_{}.csv", kind, at.format("%Y%m%d_%H%M%S"))
    }
}

/// Parse CSV with a header row. Short rows are padded with missing cells.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.trim().is_empty()) {
        return Err(DoiDatesError::EmptyInput("CSV has no header row".to_string()));
    }

    let mut table = Table::new(columns);
    for record in rdr.records() {
        let record = record?;
        table.push_row(record.iter().map(Cell::from_field).collect());
    }
    Ok(table)
}

/// Load one CSV file
pub fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    read_table(file)
}

/// Load and concatenate several CSV files.
///
/// Files that fail to load are logged and skipped; fails only when none load.
pub fn load_files(paths: &[PathBuf]) -> Result<Table> {
    if paths.is_empty() {
        return Err(DoiDatesError::EmptyInput("No files uploaded".to_string()));
    }

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        match load_csv(path) {
            Ok(table) => {
                info!(file = %path.display(), rows = table.len(), "Loaded CSV");
                tables.push(table);
            }
            Err(e) => warn!(file = %path.display(), error = %e, "Error loading CSV"),
        }
    }

    combine(tables)
}

/// Parse and concatenate in-memory CSV documents given as (name, content)
pub fn load_documents<'a, I>(documents: I) -> Result<Table>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut tables = Vec::new();
    for (name, content) in documents {
        match read_table(content.as_bytes()) {
            Ok(table) => {
                info!(file = name, rows = table.len(), "Loaded CSV");
                tables.push(table);
            }
            Err(e) => warn!(file = name, error = %e, "Error loading CSV"),
        }
    }
    combine(tables)
}

fn combine(tables: Vec<Table>) -> Result<Table> {
    if tables.is_empty() {
        return Err(DoiDatesError::EmptyInput(
            "No input file could be loaded".to_string(),
        ));
    }
    let combined = Table::concat(tables);
    info!(rows = combined.len(), "Total combined rows");
    Ok(combined)
}

/// Write a table with its header row
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);

    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.cells().iter().map(|c| c.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render a table as CSV text
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| DoiDatesError::Parse(format!("CSV output is not UTF-8: {}", e)))
}

/// Save a table to a CSV file
pub fn save_csv(path: &Path, table: &Table) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table(table, file)?;
    info!(path = %path.display(), rows = table.len(), "Saved CSV");
    Ok(())
}
