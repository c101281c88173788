use super::types::SheetTable;
use super::utils::{coerce_number, is_boolean_token, is_date_string};
use crate::models::{OrderedMap, PatternSignal};
use rayon::prelude::*;
use std::collections::HashSet;

/// Profiles every column of `table`, in column order.
pub fn analyze_column_patterns(table: &SheetTable) -> OrderedMap<PatternSignal> {
    let signals: Vec<PatternSignal> = table.data
        .par_iter()
        .map(|values| column_signal(values))
        .collect();

    table.columns.iter().cloned().zip(signals).collect()
}

pub fn column_signal(values: &[Option<String>]) -> PatternSignal {
    let present: Vec<&str> = values
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .collect();

    if present.is_empty() {
        return PatternSignal::default();
    }

    let (numeric, date, boolean) = present.iter().fold(
        (0usize, 0usize, 0usize),
        |(mut num, mut date, mut boolean), value| {
            if coerce_number(value).is_some() {
                num += 1;
            }
            if is_date_string(value) {
                date += 1;
            }
            if is_boolean_token(value) {
                boolean += 1;
            }
            (num, date, boolean)
        },
    );
    let distinct: HashSet<&str> = present.iter().copied().collect();

    let total = present.len() as f64;
    PatternSignal {
        numeric_ratio: numeric as f64 / total,
        date_ratio: date as f64 / total,
        boolean_ratio: boolean as f64 / total,
        unique_ratio: distinct.len() as f64 / total,
    }
}
