//! End-to-end processing run: identifier detection, batch lookup, merge.

use crate::batch::{run_batch, DateMap};
use crate::crossref::DateLookup;
use crate::error::{DoiDatesError, Result};
use crate::filter::{filter_by_range, DateRange};
use crate::merge::{collect_identifiers, find_identifier_column, merge_dates};
use crate::table::Table;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Counts reported after a run.
///
/// Computed from the stored date map only: identifiers whose lookup was
/// unavailable were never stored and are not counted anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Entries in the date map
    pub processed: usize,
    /// Entries holding a real date
    pub found: usize,
    /// Entries holding the `Error` marker
    pub not_found: usize,
}

impl Summary {
    pub fn from_dates(dates: &DateMap) -> Self {
        let processed = dates.len();
        let found = dates.values().filter(|d| d.is_dated()).count();
        Self {
            processed,
            found,
            not_found: processed - found,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total DOIs processed: {}", self.processed)?;
        writeln!(f, "DOIs with dates found: {}", self.found)?;
        write!(f, "DOIs without dates: {}", self.not_found)
    }
}

/// Everything a completed run hands back to its caller
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Input rows with `Created Date` appended, sorted by it
    pub table: Table,
    /// Column the identifiers were read from
    pub identifier_column: String,
    pub dates: DateMap,
    /// Diagnostic lines for failed lookups
    pub errors: Vec<String>,
    pub summary: Summary,
}

impl RunOutput {
    /// Filtered view of the merged table; the run itself is left untouched
    pub fn filtered(&self, range: &DateRange) -> Table {
        filter_by_range(&self.table, range)
    }
}

/// Enrich `table` with creation dates.
///
/// Fails only when no identifier column exists or no identifiers remain;
/// per-identifier failures end up as `Error` cells and error-log lines.
pub async fn process<L, F>(table: Table, lookup: &L, workers: usize, on_progress: F) -> Result<RunOutput>
where
    L: DateLookup,
    F: FnMut(f64),
{
    let identifier_column = find_identifier_column(table.columns())?.to_string();
    let identifiers = collect_identifiers(&table, &identifier_column)?;

    if identifiers.is_empty() {
        return Err(DoiDatesError::EmptyInput("No DOIs found in the files".to_string()));
    }

    info!(
        column = %identifier_column,
        count = identifiers.len(),
        "Found DOIs to process"
    );

    let batch = run_batch(lookup, &identifiers, workers, on_progress).await;
    let table = merge_dates(table, &identifier_column, &batch.dates)?;
    let summary = Summary::from_dates(&batch.dates);

    info!(
        rows = table.len(),
        processed = summary.processed,
        found = summary.found,
        not_found = summary.not_found,
        "Run complete"
    );

    Ok(RunOutput {
        table,
        identifier_column,
        dates: batch.dates,
        errors: batch.errors,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossref::{CrossrefClient, CrossrefConfig, DateResult};
    use crate::csv_io::{read_table, to_csv_string};
    use crate::date::{CreatedDate, PartialDate};
    use crate::merge::CREATED_DATE_COLUMN;
    use crate::table::Cell;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct ScriptedLookup;

    impl DateLookup for ScriptedLookup {
        async fn lookup(&self, doi: &str) -> DateResult {
            let outcome = match doi {
                "10.1/a" => Ok(CreatedDate::Dated(PartialDate::year_month(2020, 5))),
                "10.1/c" => Ok(CreatedDate::Unavailable),
                _ => Err(DoiDatesError::Timeout(30)),
            };
            DateResult {
                doi: doi.to_string(),
                outcome,
            }
        }
    }

    /// Dates every identifier as 2020-05 and remembers what it was asked for
    #[derive(Default)]
    struct RecordingLookup {
        seen: Mutex<Vec<String>>,
    }

    impl DateLookup for RecordingLookup {
        async fn lookup(&self, doi: &str) -> DateResult {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(doi.to_string());
            }
            DateResult {
                doi: doi.to_string(),
                outcome: Ok(CreatedDate::Dated(PartialDate::year_month(2020, 5))),
            }
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    fn input(rows: &[&str]) -> Table {
        let mut table = Table::new(vec!["Title".to_string(), "DOI".to_string()]);
        for (i, doi) in rows.iter().enumerate() {
            table.push_row(vec![Cell::Text(format!("Paper {}", i)), Cell::from_field(doi)]);
        }
        table
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() -> Result<()> {
        let mut progress = Vec::new();
        let output = process(input(&["10.1/a", "10.1/b", "nan"]), &ScriptedLookup, 4, |p| {
            progress.push(p)
        })
        .await?;

        assert_eq!(output.table.len(), 3);
        assert_eq!(output.identifier_column, "DOI");
        assert_eq!(output.table.columns().last().map(String::as_str), Some(CREATED_DATE_COLUMN));
        assert_eq!(output.table.value(0, CREATED_DATE_COLUMN), Some(&Cell::Missing));
        assert_eq!(output.table.value(0, "DOI"), Some(&Cell::Missing));
        assert_eq!(
            output.table.value(2, CREATED_DATE_COLUMN),
            Some(&Cell::from("2020-05"))
        );

        assert_eq!(
            output.summary,
            Summary {
                processed: 2,
                found: 1,
                not_found: 1
            }
        );
        assert_eq!(output.errors.len(), 1);
        assert_eq!(progress.last().copied(), Some(1.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_identifiers_not_counted() -> Result<()> {
        let output = process(input(&["10.1/a", "10.1/c"]), &ScriptedLookup, 2, |_| {}).await?;
        assert_eq!(output.summary.processed, 1);
        assert!(!output.dates.contains_key("10.1/c"));
        assert_eq!(output.table.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_identifier_column() {
        let mut table = Table::new(vec!["Title".to_string()]);
        table.push_row(vec![Cell::from("Paper")]);
        let result = process(table, &ScriptedLookup, 4, |_| {}).await;
        assert!(matches!(result, Err(DoiDatesError::ColumnNotFound { .. })));
    }

    #[tokio::test]
    async fn test_no_identifiers() {
        let result = process(input(&["nan", ""]), &ScriptedLookup, 4, |_| {}).await;
        assert!(matches!(result, Err(DoiDatesError::EmptyInput(_))));
    }

    #[tokio::test]
    async fn test_filtered_view() -> Result<()> {
        let output = process(input(&["10.1/a", "10.1/b"]), &ScriptedLookup, 4, |_| {}).await?;
        let range = DateRange::new(NaiveDate::from_ymd_opt(2020, 1, 1), None);
        let filtered = output.filtered(&range);
        assert_eq!(filtered.len(), 1);
        assert_eq!(output.table.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_numeric_looking_identifiers_kept_verbatim() -> Result<()> {
        let table = read_table("DOI,Zip\n10.1/a,02134\n10.1000,1.50\n".as_bytes())?;
        let lookup = RecordingLookup::default();
        let output = process(table, &lookup, 1, |_| {}).await?;

        let seen = lookup.seen.lock().expect("lock").clone();
        assert_eq!(seen, vec!["10.1/a".to_string(), "10.1000".to_string()]);
        assert!(output.dates.contains_key("10.1000"));

        let csv = to_csv_string(&output.table)?;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "DOI,Zip,Created Date",
                "10.1/a,02134,2020-05",
                "10.1000,1.50,2020-05"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_process_future_is_send() -> Result<()> {
        let client = CrossrefClient::new(CrossrefConfig::default())?;
        let mut table = Table::new(vec!["DOI".to_string()]);
        table.push_row(vec![Cell::from("10.1/a")]);

        let future = process(table, &client, 4, |_| {});
        assert_send(&future);
        Ok(())
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            processed: 3,
            found: 2,
            not_found: 1,
        };
        assert_eq!(
            summary.to_string(),
            "Total DOIs processed: 3\nDOIs with dates found: 2\nDOIs without dates: 1"
        );
    }
}
