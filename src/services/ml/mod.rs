//! ML-readiness profiling of cleaned sheets.
//!
//! A sheet goes through four stages: column typing, missingness, IQR outlier
//! capping on numeric columns, and construction of an imputed, scaled and
//! one-hot encoded feature matrix. Every stage is total over its input; an
//! empty sheet yields an empty profile.

pub mod features;
pub mod outliers;
pub mod typing;

use crate::config::ProfilingConfig;
use crate::error::AppError;
use crate::models::{OrderedMap, OutlierSummary, SheetMlPreview};
use crate::services::excel::types::SheetTable;
use polars::prelude::*;
use rayon::prelude::*;

pub use features::{build_feature_matrix, FeatureMatrix};
pub use outliers::{cap_outliers, OutlierCap};
pub use typing::{classify_series, ColumnKind, TypedColumn};

pub const PIPELINE_STEPS: [&str; 3] = [
    "Numeric: median imputation + Z-score scaling",
    "Categorical: most-frequent imputation + one-hot encoding (drop_first)",
    "Outliers: capped with IQR rule",
];

pub struct MlProfiler {
    config: ProfilingConfig,
}

impl MlProfiler {
    pub fn new(config: ProfilingConfig) -> Self {
        Self { config }
    }

    /// Profiles a cleaned sheet frame.
    pub fn profile_frame(&self, sheet: &str, frame: &DataFrame) -> Result<SheetMlPreview, AppError> {
        let mut preview = SheetMlPreview {
            sheet: sheet.to_string(),
            ..Default::default()
        };
        let rows = frame.height();
        if rows == 0 {
            tracing::debug!("Sheet {} has no rows, returning empty profile", sheet);
            return Ok(preview);
        }

        let mut columns: Vec<TypedColumn> = frame
            .get_columns()
            .par_iter()
            .map(|series| classify_series(series, &self.config))
            .collect::<PolarsResult<_>>()?;

        preview.missingness = columns
            .iter()
            .map(|c| (c.name.clone(), c.missingness()))
            .collect::<OrderedMap<f64>>();

        for column in columns.iter_mut() {
            if let ColumnKind::Numeric(values) = &mut column.kind {
                if let Some(cap) = cap_outliers(values, self.config.iqr_multiplier) {
                    preview.outliers.push(OutlierSummary {
                        column: column.name.clone(),
                        lower_cap: cap.lower,
                        upper_cap: cap.upper,
                        capped_values: cap.capped,
                    });
                }
            }
        }

        let numeric = columns.iter().filter(|c| c.is_numeric()).count();
        let categorical = columns.iter().filter(|c| c.is_categorical()).count();
        tracing::info!(
            "Sheet {}: {} numeric, {} categorical, {} unclassified columns",
            sheet,
            numeric,
            categorical,
            columns.len() - numeric - categorical
        );
        if numeric == 0 && categorical == 0 {
            return Ok(preview);
        }

        let matrix = build_feature_matrix(&columns, rows)?;
        preview.feature_preview = matrix.preview_rows(self.config.feature_preview_rows);
        preview.feature_names = matrix.names;
        preview.pipeline_steps = PIPELINE_STEPS.iter().map(|s| s.to_string()).collect();
        Ok(preview)
    }

    pub fn profile_table(&self, sheet: &str, table: &SheetTable) -> Result<SheetMlPreview, AppError> {
        let frame = table.to_frame()?;
        self.profile_frame(sheet, &frame)
    }
}
