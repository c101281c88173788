//! IQR-based outlier capping for numeric columns.

use polars::prelude::*;

/// Bounds applied to one column and how many values they changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierCap {
    pub lower: f64,
    pub upper: f64,
    pub capped: usize,
}

/// Quantile of ascending `sorted` values with linear interpolation between
/// the closest ranks. `sorted` must be non-empty.
///
/// Interpolates as a weighted sum so neighbours of opposite sign near
/// `f64::MAX` stay finite.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if frac == 0.0 {
        return sorted[lo];
    }
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// `[Q1 - k*IQR, Q3 + k*IQR]` over ascending `sorted` values.
pub fn iqr_bounds(sorted: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    if sorted.is_empty() {
        return None;
    }
    let q1 = quantile(sorted, 0.25);
    let q3 = quantile(sorted, 0.75);
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Clips present values into the IQR bounds, replacing `values`. Nulls stay
/// null and are never counted as capped. Returns `None` for an all-null column.
///
/// Bounds that are NaN or inverted leave the column untouched.
pub fn cap_outliers(values: &mut Float64Chunked, multiplier: f64) -> Option<OutlierCap> {
    let mut sorted: Vec<f64> = (&*values).into_iter().flatten().collect();
    sorted.sort_by(f64::total_cmp);
    let (lower, upper) = iqr_bounds(&sorted, multiplier)?;

    if lower.is_nan() || upper.is_nan() || lower > upper {
        tracing::warn!("Skipping outlier capping for {}: bounds [{}, {}]", values.name(), lower, upper);
        return Some(OutlierCap { lower, upper, capped: 0 });
    }

    let mut capped = 0;
    let clipped: Float64Chunked = (&*values)
        .into_iter()
        .map(|value| {
            value.map(|v| {
                let c = v.clamp(lower, upper);
                if c != v {
                    capped += 1;
                }
                c
            })
        })
        .collect();
    let name = values.name().to_string();
    *values = clipped.with_name(&name);

    Some(OutlierCap { lower, upper, capped })
}
