use polars::prelude::*;
use crate::models::{CleanupReport, Record};

/// A worksheet as text cells, stored column-major. `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Option<String>>>,
}

impl SheetTable {
    pub fn new(columns: Vec<String>, data: Vec<Vec<Option<String>>>) -> Self {
        debug_assert_eq!(columns.len(), data.len());
        Self { columns, data }
    }

    /// Builds a table from row-major cells; short rows are padded with missing cells.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = columns.len();
        let mut data: Vec<Vec<Option<String>>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in data.iter_mut() {
                column.push(cells.next().flatten());
            }
        }
        Self { columns, data }
    }

    pub fn height(&self) -> usize {
        self.data.first().map_or(0, |c| c.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.data[idx].as_slice())
    }

    /// Row records with missing cells rendered as empty text.
    pub fn records(&self, limit: usize) -> Vec<Record> {
        (0..self.height().min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .zip(&self.data)
                    .map(|(name, column)| {
                        let text = column[row].clone().unwrap_or_default();
                        (name.clone(), serde_json::Value::String(text))
                    })
                    .collect()
            })
            .collect()
    }

    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let series: Vec<Series> = self.columns
            .iter()
            .zip(&self.data)
            .map(|(name, values)| Series::new(name, values.clone()))
            .collect();
        DataFrame::new(series)
    }
}

/// Result of cleaning one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSheet {
    pub table: SheetTable,
    pub report: CleanupReport,
}

/// Header row plus data rows as read from the workbook, before cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub name: String,
    pub header: Vec<Option<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// A cleaned sheet handed to the ML profiler.
#[derive(Debug, Clone)]
pub struct SheetFrame {
    pub sheet: String,
    pub frame: DataFrame,
}
