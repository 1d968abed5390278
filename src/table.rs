//! In-memory table model.
//!
//! A [`Table`] owns an ordered list of column names and a list of
//! [`Record`]s; every record holds exactly one [`Cell`] per column.

use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    /// Numeric field; `text` is the field exactly as read and is what gets rendered
    Number { value: f64, text: String },
    Text(String),
}

impl Cell {
    /// Type a raw CSV field: empty and `nan` are missing, finite numbers are numbers.
    ///
    /// The source text is always kept, so `02134` or `10.1000` export unchanged.
    pub fn from_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number {
                value,
                text: raw.to_string(),
            },
            _ => Self::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Stringified value used for identifier matching; `None` when missing.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Number { text, .. } | Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One row, positionally aligned with its table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Vec<Cell>);

impl Record {
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.0.get(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }
}

/// Ordered rows sharing one ordered column set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with missing cells or truncating to the column count
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Missing);
        self.rows.push(Record(cells));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |r| r.get(index))
    }

    /// Drop a column if present; returns whether it existed
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(index) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(index);
        for row in &mut self.rows {
            row.0.remove(index);
        }
        true
    }

    /// Append a column as the last one, one value per row (missing when short)
    pub fn push_column(&mut self, name: &str, values: Vec<Cell>) {
        self.columns.push(name.to_string());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.0.push(values.next().unwrap_or(Cell::Missing));
        }
    }

    /// Stable sort of rows by a derived key
    pub fn sort_rows_by_key<K, F>(&mut self, key: F)
    where
        K: Ord,
        F: FnMut(&Record) -> K,
    {
        self.rows.sort_by_key(key);
    }

    /// New table holding the rows that satisfy `keep`
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Record) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }

    /// Concatenate tables row-wise. Columns are unioned in first-seen order;
    /// cells for columns a table lacks are missing.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = Table::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = combined
                .columns
                .iter()
                .map(|c| table.column_index(c))
                .collect();
            for row in table.rows {
                let cells = mapping
                    .iter()
                    .map(|index| {
                        index
                            .and_then(|i| row.get(i).cloned())
                            .unwrap_or(Cell::Missing)
                    })
                    .collect();
                combined.push_row(cells);
            }
        }
        combined
    }
}

#[cfg(test)]
impl Table {
    /// Cell at (row, column name)
    pub(crate) fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}
