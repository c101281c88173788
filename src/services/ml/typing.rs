use crate::config::ProfilingConfig;
use crate::services::excel::utils::coerce_number;
use polars::prelude::*;

/// How a column is treated by the rest of the profiling stages.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    /// Coerced values; unparseable cells are null.
    Numeric(Float64Chunked),
    Categorical(StringChunked),
    /// No non-missing values at all; contributes no features.
    Unclassified { len: usize },
}

#[derive(Debug, Clone)]
pub struct TypedColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl TypedColumn {
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ColumnKind::Numeric(_))
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, ColumnKind::Categorical(_))
    }

    /// Share of missing cells after typing.
    pub fn missingness(&self) -> f64 {
        let (missing, len) = match &self.kind {
            ColumnKind::Numeric(values) => (values.null_count(), values.len()),
            ColumnKind::Categorical(values) => (values.null_count(), values.len()),
            ColumnKind::Unclassified { len } => (*len, *len),
        };
        if len == 0 {
            0.0
        } else {
            missing as f64 / len as f64
        }
    }
}

/// Numeric iff more than `numeric_share_threshold` of all cells parse as numbers
/// and there are more than `min_distinct_numeric` distinct non-missing values.
///
/// Numbers are parsed with the same rules the pattern analyzer uses.
pub fn classify_series(series: &Series, config: &ProfilingConfig) -> PolarsResult<TypedColumn> {
    let name = series.name().to_string();
    let text = series.cast(&DataType::String)?;
    let distinct = text.drop_nulls().n_unique()?;
    if distinct == 0 {
        return Ok(TypedColumn {
            name,
            kind: ColumnKind::Unclassified { len: series.len() },
        });
    }

    let values = text.str()?;
    let parsed: Float64Chunked = values
        .into_iter()
        .map(|v| v.and_then(coerce_number))
        .collect();
    let parsed = parsed.with_name(&name);
    let numeric_share = if parsed.is_empty() {
        0.0
    } else {
        (parsed.len() - parsed.null_count()) as f64 / parsed.len() as f64
    };

    let is_numeric = numeric_share > config.numeric_share_threshold && distinct > config.min_distinct_numeric;
    tracing::debug!(
        "Column {}: numeric share {:.2}, {} distinct -> {}",
        name,
        numeric_share,
        distinct,
        if is_numeric { "numeric" } else { "categorical" }
    );

    let kind = if is_numeric {
        ColumnKind::Numeric(parsed)
    } else {
        ColumnKind::Categorical(values.clone())
    };
    Ok(TypedColumn { name, kind })
}
