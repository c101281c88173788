//! Sheet cleaning: header normalization, blank-to-missing conversion and
//! coverage-based pruning of sparse columns and rows.

use super::headers::normalize_headers;
use super::patterns::analyze_column_patterns;
use super::types::{CleanedSheet, SheetTable};
use crate::config::CleaningConfig;
use crate::models::{CleanupReport, OrderedMap};
use rayon::prelude::*;
use tracing::debug;

/// Cleans one sheet. Never fails: degenerate input yields a zero-row or
/// unpruned-column table.
pub fn clean_sheet(table: &SheetTable, config: &CleaningConfig) -> CleanedSheet {
    let raw_labels: Vec<Option<&str>> = table.columns.iter().map(|c| Some(c.as_str())).collect();
    let columns = normalize_headers(&raw_labels);

    let data: Vec<Vec<Option<String>>> = table.data
        .par_iter()
        .map(|values| values.iter().map(|v| normalize_cell(v.as_deref())).collect())
        .collect();
    let height = table.height();

    let coverage: Vec<f64> = data.iter().map(|values| coverage_of(values)).collect();
    let column_coverage: OrderedMap<f64> = columns.iter().cloned().zip(coverage.iter().copied()).collect();

    let mut keep: Vec<usize> = coverage
        .iter()
        .enumerate()
        .filter(|(_, cov)| **cov >= config.min_column_coverage)
        .map(|(idx, _)| idx)
        .collect();
    if keep.is_empty() {
        // Never prune down to zero columns.
        keep = (0..columns.len()).collect();
    }
    let dropped_columns = columns.len() - keep.len();

    let kept_columns: Vec<String> = keep.iter().map(|&idx| columns[idx].clone()).collect();
    let mut column_mask = vec![false; columns.len()];
    keep.iter().for_each(|&idx| column_mask[idx] = true);
    let kept_data: Vec<Vec<Option<String>>> = data
        .into_iter()
        .zip(&column_mask)
        .filter_map(|(values, keep)| keep.then_some(values))
        .collect();

    let row_mask: Vec<bool> = (0..height)
        .map(|row| row_signal(&kept_data, row) >= config.min_row_signal)
        .collect();
    let dropped_rows = row_mask.iter().filter(|keep| !**keep).count();

    let filtered: Vec<Vec<Option<String>>> = kept_data
        .into_iter()
        .map(|values| {
            values
                .into_iter()
                .zip(&row_mask)
                .filter_map(|(value, keep)| keep.then_some(value))
                .collect()
        })
        .collect();

    let cleaned = SheetTable::new(kept_columns, filtered);
    let pattern_signals = analyze_column_patterns(&cleaned);

    debug!(
        "Cleaned sheet: {} -> {} columns, {} -> {} rows",
        columns.len(),
        cleaned.width(),
        height,
        cleaned.height()
    );

    CleanedSheet {
        table: cleaned,
        report: CleanupReport {
            dropped_rows,
            dropped_columns,
            column_coverage,
            pattern_signals,
        },
    }
}

/// Trims the cell; empty or single-space text becomes missing.
fn normalize_cell(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    match trimmed {
        "" | " " => None,
        text => Some(text.to_string()),
    }
}

/// Share of non-missing values; 0.0 for an empty column.
fn coverage_of(values: &[Option<String>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| v.is_some()).count() as f64 / values.len() as f64
}

fn row_signal(columns: &[Vec<Option<String>>], row: usize) -> f64 {
    if columns.is_empty() {
        return 0.0;
    }
    let present = columns.iter().filter(|c| c[row].is_some()).count();
    present as f64 / columns.len() as f64
}
