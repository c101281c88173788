use super::typing::{ColumnKind, TypedColumn};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Scale values below this are treated as constant columns (scaled by 1).
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Encoded feature matrix, stored column-major. `rows` is kept separately so
/// a matrix without features still has one (empty) row per input row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub rows: usize,
}

impl FeatureMatrix {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    /// First `limit` rows, row-major.
    pub fn preview_rows(&self, limit: usize) -> Vec<Vec<f64>> {
        (0..self.rows.min(limit))
            .map(|row| self.columns.iter().map(|c| c[row]).collect())
            .collect()
    }

    fn push(&mut self, name: String, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.rows);
        self.names.push(name);
        self.columns.push(values);
    }
}

/// Median-imputed, standardized numeric block followed by the
/// mode-imputed, one-hot (first level dropped) categorical block.
pub fn build_feature_matrix(columns: &[TypedColumn], rows: usize) -> PolarsResult<FeatureMatrix> {
    let mut matrix = FeatureMatrix::new(rows);

    for column in columns {
        if let ColumnKind::Numeric(values) = &column.kind {
            if let Some(scaled) = impute_and_scale(values)? {
                matrix.push(format!("numeric__{}", column.name), scaled);
            }
        }
    }

    for column in columns {
        if let ColumnKind::Categorical(values) = &column.kind {
            for (level, indicator) in one_hot_drop_first(values) {
                matrix.push(format!("categorical__{}_{}", column.name, level), indicator);
            }
        }
    }

    Ok(matrix)
}

fn impute_and_scale(values: &Float64Chunked) -> PolarsResult<Option<Vec<f64>>> {
    let Some(fill) = values.median() else {
        return Ok(None);
    };
    let imputed = values.fill_null_with_values(fill)?;
    let (Some(mean), Some(std)) = (imputed.mean(), imputed.std(0)) else {
        return Ok(None);
    };
    let scale = if std < MIN_SCALE { 1.0 } else { std };

    Ok(Some(imputed.into_no_null_iter().map(|v| (v - mean) / scale).collect()))
}

/// Most frequent value; ties go to the lexicographically smallest.
fn mode(values: &StringChunked) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| a_count.cmp(b_count).then_with(|| b_val.cmp(a_val)))
        .map(|(value, _)| value)
}

/// Indicator columns for every sorted level except the first.
fn one_hot_drop_first(values: &StringChunked) -> Vec<(String, Vec<f64>)> {
    let Some(fill) = mode(values) else {
        return Vec::new();
    };
    let imputed: Vec<&str> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
    let levels: BTreeSet<&str> = imputed.iter().copied().collect();

    levels
        .into_iter()
        .skip(1)
        .map(|level| {
            let indicator = imputed
                .iter()
                .map(|v| if *v == level { 1.0 } else { 0.0 })
                .collect();
            (level.to_string(), indicator)
        })
        .collect()
}
