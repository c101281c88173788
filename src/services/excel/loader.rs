use super::cleaner::clean_sheet;
use super::headers::normalize_headers;
use super::types::{RawSheet, SheetFrame, SheetTable};
use super::utils::cell_to_text;
use crate::config::{CleaningConfig, LimitsConfig};
use crate::error::AppError;
use crate::models::SheetPreview;
use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::time::Instant;

type Workbook<'a> = Sheets<Cursor<&'a [u8]>>;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Rows returned per sheet in `preview_rows`.
    pub sample_rows: usize,
    /// Cleaned rows beyond this mark the sheet as truncated.
    pub max_rows_per_sheet: usize,
    /// Sheets to load; `None` or empty loads all of them.
    pub sheet_names: Option<Vec<String>>,
}

impl PreviewOptions {
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            sample_rows: limits.preview_sample_rows,
            max_rows_per_sheet: limits.preview_max_rows,
            sheet_names: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameOptions {
    pub max_rows_per_sheet: usize,
    pub sheet_names: Option<Vec<String>>,
}

impl FrameOptions {
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            max_rows_per_sheet: limits.frame_max_rows,
            sheet_names: None,
        }
    }
}

/// Opens workbooks from raw bytes and runs every selected sheet through the cleaner.
pub struct WorkbookLoader {
    cleaning: CleaningConfig,
}

impl WorkbookLoader {
    pub fn new(cleaning: CleaningConfig) -> Self {
        Self { cleaning }
    }

    /// Preview mode: bounded, JSON-ready samples plus the cleanup report per sheet.
    pub fn load_previews(&self, bytes: &[u8], options: &PreviewOptions) -> Result<Vec<SheetPreview>, AppError> {
        let start = Instant::now();
        let mut workbook = open_workbook(bytes)?;
        let selected = select_sheets(&workbook, options.sheet_names.as_deref())?;

        let mut previews = Vec::with_capacity(selected.len());
        for sheet_name in &selected {
            let sheet_start = Instant::now();
            // One extra row so an exactly-full sheet is told apart from a truncated one.
            let raw = read_raw_sheet(&mut workbook, sheet_name, options.max_rows_per_sheet.saturating_add(1))?;
            let header = raw.header.clone();
            let cleaned = clean_sheet(&raw_to_table(raw), &self.cleaning);

            let total_rows = cleaned.table.height();
            let truncated = total_rows > options.max_rows_per_sheet;
            let retained = total_rows.min(options.max_rows_per_sheet);

            let mut columns = cleaned.table.columns.clone();
            if columns.is_empty() {
                columns = normalize_headers(&header);
            }

            let preview_rows = cleaned.table.records(options.sample_rows.min(retained));
            tracing::info!(
                "Sheet {}: {} columns, {} rows (truncated: {}), dropped {} rows / {} columns in {:?}",
                sheet_name,
                columns.len(),
                total_rows,
                truncated,
                cleaned.report.dropped_rows,
                cleaned.report.dropped_columns,
                sheet_start.elapsed()
            );

            previews.push(SheetPreview {
                sheet: sheet_name.clone(),
                columns,
                sample_row_count: preview_rows.len(),
                preview_rows,
                total_rows,
                truncated,
                cleanup: cleaned.report,
            });
        }

        tracing::info!("Previewed {} sheets in {:?}", previews.len(), start.elapsed());
        Ok(previews)
    }

    /// Frame mode: the cleaned sheets as data frames, for ML profiling.
    pub fn load_frames(&self, bytes: &[u8], options: &FrameOptions) -> Result<Vec<SheetFrame>, AppError> {
        let start = Instant::now();
        let mut workbook = open_workbook(bytes)?;
        let selected = select_sheets(&workbook, options.sheet_names.as_deref())?;

        let mut frames = Vec::with_capacity(selected.len());
        for sheet_name in &selected {
            let raw = read_raw_sheet(&mut workbook, sheet_name, options.max_rows_per_sheet)?;
            let cleaned = clean_sheet(&raw_to_table(raw), &self.cleaning);
            let frame = cleaned.table.to_frame()?;
            tracing::debug!("Loaded frame for sheet {}: {:?}", sheet_name, frame.shape());
            frames.push(SheetFrame {
                sheet: sheet_name.clone(),
                frame,
            });
        }

        if frames.is_empty() {
            tracing::warn!("No sheets left to load after filtering");
            return Err(AppError::NotFound("No sheets found in workbook".to_string()));
        }

        tracing::info!("Loaded {} sheet frames in {:?}", frames.len(), start.elapsed());
        Ok(frames)
    }
}

fn open_workbook(bytes: &[u8]) -> Result<Workbook<'_>, AppError> {
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Empty upload received".to_string()));
    }

    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        tracing::error!("Failed to open workbook: {}", e);
        AppError::InvalidInput(format!("Invalid Excel file: {}", e))
    })?;
    tracing::debug!("Opened workbook ({} bytes)", bytes.len());
    Ok(workbook)
}

/// Sheets to process, in workbook order. Fails if the filter names unknown sheets.
fn select_sheets(workbook: &Workbook<'_>, requested: Option<&[String]>) -> Result<Vec<String>, AppError> {
    let available = workbook.sheet_names().to_vec();
    let requested = match requested {
        Some(names) if !names.is_empty() => names,
        _ => return Ok(available),
    };

    let missing: BTreeSet<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|name| !available.iter().any(|a| a == name))
        .collect();
    if !missing.is_empty() {
        let missing_list = missing.into_iter().collect::<Vec<_>>().join(", ");
        return Err(AppError::NotFound(format!("Sheet(s) not found: {}", missing_list)));
    }

    Ok(available
        .into_iter()
        .filter(|name| requested.contains(name))
        .collect())
}

/// Reads the header row and at most `max_rows` data rows, every cell as text.
fn read_raw_sheet(workbook: &mut Workbook<'_>, sheet_name: &str, max_rows: usize) -> Result<RawSheet, AppError> {
    let range = workbook.worksheet_range(sheet_name)?;
    let mut rows = range.rows();

    let header = rows
        .next()
        .map(row_to_text)
        .unwrap_or_default();
    let rows = rows.take(max_rows).map(row_to_text).collect();

    Ok(RawSheet {
        name: sheet_name.to_string(),
        header,
        rows,
    })
}

fn row_to_text(row: &[Data]) -> Vec<Option<String>> {
    row.iter().map(cell_to_text).collect()
}

fn raw_to_table(raw: RawSheet) -> SheetTable {
    tracing::debug!("Sheet {}: {} header cells, {} data rows read", raw.name, raw.header.len(), raw.rows.len());
    let columns = raw.header
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    SheetTable::from_rows(columns, raw.rows)
}
