//! Date range filtering of merged tables.

use crate::date::PartialDate;
use crate::error::{DoiDatesError, Result};
use crate::merge::CREATED_DATE_COLUMN;
use crate::table::{Cell, Table};
use chrono::NaiveDate;

/// Optional inclusive calendar range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Neither bound set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Parse a `YYYY-MM-DD` bound
pub fn parse_bound(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| DoiDatesError::Config(format!("Invalid date '{}': {}", text, e)))
}

/// Rows whose `Created Date` falls inside `range`.
///
/// A row's date is the first day of its month (January 1 for year-only
/// dates). Rows without a parseable date never match a bounded range. An
/// unbounded range returns the table unchanged. The input is never modified.
pub fn filter_by_range(table: &Table, range: &DateRange) -> Table {
    if range.is_unbounded() {
        return table.clone();
    }

    let Some(index) = table.column_index(CREATED_DATE_COLUMN) else {
        return table.filter_rows(|_| false);
    };

    table.filter_rows(|row| {
        row.get(index)
            .and_then(Cell::as_key)
            .and_then(|text| PartialDate::parse(&text))
            .and_then(|date| date.first_day())
            .is_some_and(|day| range.contains(day))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(dates: &[&str]) -> Table {
        let mut t = Table::new(vec!["DOI".to_string(), CREATED_DATE_COLUMN.to_string()]);
        for (i, date) in dates.iter().enumerate() {
            t.push_row(vec![Cell::Text(format!("10.1/{}", i)), Cell::from_field(date)]);
        }
        t
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn dates_of(table: &Table) -> Vec<String> {
        let index = table.column_index(CREATED_DATE_COLUMN).expect("column");
        table.column_values(index).map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_unbounded_is_identity() {
        let table = merged(&["", "Error", "2019-01"]);
        assert_eq!(filter_by_range(&table, &DateRange::default()), table);
    }

    #[test]
    fn test_inclusive_bounds() {
        let table = merged(&["2019-12", "2020-01", "2020-06", "2020-07"]);
        let range = DateRange::new(day(2020, 1, 1), day(2020, 6, 1));
        assert_eq!(dates_of(&filter_by_range(&table, &range)), vec!["2020-01", "2020-06"]);
    }

    #[test]
    fn test_start_mid_month_excludes_that_month() {
        let table = merged(&["2020-05", "2020-06"]);
        let range = DateRange::new(day(2020, 5, 14), None);
        assert_eq!(dates_of(&filter_by_range(&table, &range)), vec!["2020-06"]);
    }

    #[test]
    fn test_unparseable_rows_excluded() {
        let table = merged(&["", "Error", "2021-03"]);
        let range = DateRange::new(None, day(2030, 1, 1));
        let filtered = filter_by_range(&table, &range);
        assert_eq!(dates_of(&filtered), vec!["2021-03"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_year_only_dates_tolerated() {
        let table = merged(&["2018", "2020"]);
        let range = DateRange::new(day(2019, 1, 1), day(2020, 12, 31));
        assert_eq!(dates_of(&filter_by_range(&table, &range)), vec!["2020"]);
    }

    #[test]
    fn test_missing_column_matches_nothing() {
        let mut table = Table::new(vec!["DOI".to_string()]);
        table.push_row(vec![Cell::from("10.1/a")]);
        let filtered = filter_by_range(&table, &DateRange::new(day(2020, 1, 1), None));
        assert!(filtered.is_empty());
        assert_eq!(filtered.columns(), table.columns());
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound("2020-05-14").ok(), day(2020, 5, 14));
        assert!(matches!(parse_bound("2020-05"), Err(DoiDatesError::Config(_))));
    }
}
