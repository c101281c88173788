use bytes::Bytes;
use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{
    MlPipelineResponse, NormalizeResponse, OrderedMap, PreviewResponse, SheetMetadata,
    SheetMlPreview,
};
use crate::services::excel::{FrameOptions, PreviewOptions, WorkbookLoader};
use crate::services::ml::MlProfiler;
use crate::services::navigation::build_navigation;
use crate::services::queue::ProcessingQueue;
use std::time::Instant;

/// What the transport layer tells us about one upload.
#[derive(Debug, Clone, Default)]
pub struct SheetRequest {
    pub filename: String,
    /// Single sheet to process; `None` (or empty) means every sheet.
    pub sheet: Option<String>,
}

impl SheetRequest {
    fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref().filter(|s| !s.is_empty())
    }

    fn sheet_filter(&self) -> Option<Vec<String>> {
        self.sheet().map(|s| vec![s.to_string()])
    }
}

pub async fn preview_workbook(
    queue: &ProcessingQueue,
    pipeline: &PipelineConfig,
    file_data: Bytes,
    request: SheetRequest,
) -> Result<PreviewResponse, AppError> {
    let start = Instant::now();
    tracing::info!("Preview requested for {} ({}KB)", request.filename, file_data.len() / 1024);

    let options = PreviewOptions {
        sheet_names: request.sheet_filter(),
        ..PreviewOptions::from_limits(&pipeline.limits)
    };
    let loader = WorkbookLoader::new(pipeline.cleaning);
    let sheets = queue
        .enqueue(move || loader.load_previews(&file_data, &options))
        .await?;

    let names: Vec<String> = sheets.iter().map(|s| s.sheet.clone()).collect();
    let total_rows_estimate: usize = sheets.iter().map(|s| s.total_rows).sum();
    tracing::info!("Preview for {} completed in {:?}", request.filename, start.elapsed());

    Ok(PreviewResponse {
        navigation: build_navigation(&names, request.sheet()),
        total_sheets: sheets.len(),
        total_rows_estimate: Some(total_rows_estimate),
        sheets,
        filename: request.filename,
    })
}

/// Row-wise JSON for every selected sheet, capped at the normalization limit.
pub async fn normalize_workbook(
    queue: &ProcessingQueue,
    pipeline: &PipelineConfig,
    file_data: Bytes,
    request: SheetRequest,
) -> Result<NormalizeResponse, AppError> {
    let start = Instant::now();
    tracing::info!("Normalization requested for {} ({}KB)", request.filename, file_data.len() / 1024);

    let options = PreviewOptions {
        sample_rows: pipeline.limits.normalize_rows,
        max_rows_per_sheet: pipeline.limits.normalize_rows,
        sheet_names: request.sheet_filter(),
    };
    let loader = WorkbookLoader::new(pipeline.cleaning);
    let sheets = queue
        .enqueue(move || loader.load_previews(&file_data, &options))
        .await?;

    let names: Vec<String> = sheets.iter().map(|s| s.sheet.clone()).collect();
    let mut rows = OrderedMap::with_capacity(sheets.len());
    let mut metadata = OrderedMap::with_capacity(sheets.len());
    for sheet in sheets {
        metadata.push(
            sheet.sheet.clone(),
            SheetMetadata {
                total_rows: sheet.total_rows,
                truncated: sheet.truncated,
            },
        );
        rows.push(sheet.sheet, sheet.preview_rows);
    }
    tracing::info!("Normalization for {} completed in {:?}", request.filename, start.elapsed());

    Ok(NormalizeResponse {
        navigation: build_navigation(&names, request.sheet()),
        sheets: rows,
        metadata,
        filename: request.filename,
    })
}

/// ML-readiness profile of every selected sheet.
pub async fn profile_workbook(
    queue: &ProcessingQueue,
    pipeline: &PipelineConfig,
    file_data: Bytes,
    request: SheetRequest,
    sample_rows: Option<usize>,
) -> Result<MlPipelineResponse, AppError> {
    let limits = &pipeline.limits;
    let max_rows = sample_rows.unwrap_or(limits.ml_default_rows);
    if !(limits.ml_min_rows..=limits.ml_max_rows).contains(&max_rows) {
        return Err(AppError::InvalidInput(format!(
            "sample_rows must be between {} and {}",
            limits.ml_min_rows, limits.ml_max_rows
        )));
    }

    let start = Instant::now();
    tracing::info!("ML profiling requested for {} (max {} rows per sheet)", request.filename, max_rows);

    let options = FrameOptions {
        max_rows_per_sheet: max_rows,
        sheet_names: request.sheet_filter(),
    };
    let loader = WorkbookLoader::new(pipeline.cleaning);
    let profiler = MlProfiler::new(pipeline.profiling);
    let sheets = queue
        .enqueue(move || {
            loader
                .load_frames(&file_data, &options)?
                .iter()
                .map(|frame| profiler.profile_frame(&frame.sheet, &frame.frame))
                .collect::<Result<Vec<SheetMlPreview>, AppError>>()
        })
        .await?;
    tracing::info!("ML profiling for {} completed in {:?}", request.filename, start.elapsed());

    Ok(MlPipelineResponse {
        filename: request.filename,
        sheets,
    })
}
