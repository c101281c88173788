use bytes::Bytes;
use rust_xlsxwriter::Workbook;
use sheet_worker::config::{CleaningConfig, PipelineConfig};
use sheet_worker::error::AppError;
use sheet_worker::services::excel::{FrameOptions, PreviewOptions, WorkbookLoader};
use sheet_worker::services::file_processor::{
    normalize_workbook, preview_workbook, profile_workbook, SheetRequest,
};
use sheet_worker::services::queue::ProcessingQueue;
use tokio_test::assert_ok;

const REGIONS: [&str; 3] = ["north", "south", "east"];

/// "Sales" has `sales_rows` full rows plus a blank separator after row 5;
/// "Notes" is a tiny text-only sheet.
fn sales_workbook(sales_rows: u32) -> Vec<u8> {
    let mut workbook = Workbook::new();

    let sales = workbook.add_worksheet();
    sales.set_name("Sales").unwrap();
    sales.write_string(0, 0, "Region").unwrap();
    sales.write_string(0, 1, "Amount").unwrap();
    sales.write_string(0, 2, "Comment").unwrap();
    let mut row = 1;
    for i in 1..=sales_rows {
        if i == 6 {
            // left blank
            row += 1;
        }
        let amount = if i == sales_rows { 10_000.0 } else { f64::from(i) };
        sales.write_string(row, 0, REGIONS[(i % 3) as usize]).unwrap();
        sales.write_number(row, 1, amount).unwrap();
        if i == 1 {
            sales.write_string(row, 2, "only one").unwrap();
        }
        row += 1;
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "Note").unwrap();
    notes.write_string(1, 0, "first").unwrap();
    notes.write_string(2, 0, "second").unwrap();

    workbook.save_to_buffer().unwrap()
}

fn numbered_workbook(rows: u32) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Data").unwrap();
    sheet.write_string(0, 0, "id").unwrap();
    sheet.write_string(0, 1, "label").unwrap();
    for i in 1..=rows {
        sheet.write_number(i, 0, f64::from(i)).unwrap();
        sheet.write_string(i, 1, &format!("row {}", i)).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// "Blank" has no cells at all; "HeaderOnly" has a header row and no data.
fn sparse_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Blank").unwrap();

    let header_only = workbook.add_worksheet();
    header_only.set_name("HeaderOnly").unwrap();
    header_only.write_string(0, 0, "a").unwrap();
    header_only.write_string(0, 1, "b").unwrap();

    workbook.save_to_buffer().unwrap()
}

fn loader() -> WorkbookLoader {
    WorkbookLoader::new(CleaningConfig::default())
}

fn preview_options(sample_rows: usize, max_rows: usize) -> PreviewOptions {
    PreviewOptions {
        sample_rows,
        max_rows_per_sheet: max_rows,
        sheet_names: None,
    }
}

fn request(sheet: Option<&str>) -> SheetRequest {
    SheetRequest {
        filename: "sales.xlsx".to_string(),
        sheet: sheet.map(str::to_string),
    }
}

#[test]
fn test_preview_cleans_every_sheet_in_order() {
    let bytes = sales_workbook(20);
    let previews = loader().load_previews(&bytes, &preview_options(5, 100)).unwrap();

    let names: Vec<&str> = previews.iter().map(|p| p.sheet.as_str()).collect();
    assert_eq!(names, vec!["Sales", "Notes"]);

    let sales = &previews[0];
    // "Comment" has 1 value in 21 rows, below the coverage threshold
    assert_eq!(sales.columns, vec!["Region", "Amount"]);
    assert_eq!(sales.cleanup.dropped_columns, 1);
    assert_eq!(sales.cleanup.dropped_rows, 1);
    assert_eq!(sales.total_rows, 20);
    assert!(!sales.truncated);
    assert_eq!(sales.sample_row_count, 5);
    assert_eq!(sales.preview_rows.len(), 5);
    assert_eq!(sales.preview_rows[0]["Region"], "south");
    assert_eq!(sales.preview_rows[0]["Amount"], "1");
    assert!(sales.cleanup.column_coverage.get("Comment").is_some());
    assert_eq!(sales.cleanup.pattern_signals.get("Amount").unwrap().numeric_ratio, 1.0);
}

#[test]
fn test_truncation_flag_and_row_cap() {
    let over = loader()
        .load_previews(&numbered_workbook(11), &preview_options(50, 10))
        .unwrap();
    assert!(over[0].truncated);
    assert!(over[0].preview_rows.len() <= 10);

    let exact = loader()
        .load_previews(&numbered_workbook(10), &preview_options(50, 10))
        .unwrap();
    assert!(!exact[0].truncated);
    assert_eq!(exact[0].total_rows, 10);
    assert_eq!(exact[0].preview_rows.len(), 10);
}

#[test]
fn test_invalid_uploads_are_rejected() {
    let empty = loader().load_previews(&[], &preview_options(5, 10));
    match empty {
        Err(AppError::InvalidInput(msg)) => assert_eq!(msg, "Empty upload received"),
        other => panic!("unexpected result: {:?}", other.map(|p| p.len())),
    }

    let garbage = loader().load_previews(b"definitely not a workbook", &preview_options(5, 10));
    match garbage {
        Err(AppError::InvalidInput(msg)) => assert!(msg.starts_with("Invalid Excel file")),
        other => panic!("unexpected result: {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_unknown_sheet_is_reported_by_name() {
    let options = PreviewOptions {
        sheet_names: Some(vec!["Sales".to_string(), "Sheet3".to_string()]),
        ..preview_options(5, 10)
    };
    let result = loader().load_previews(&sales_workbook(8), &options);
    match result {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Sheet(s) not found: Sheet3"),
        other => panic!("unexpected result: {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_frame_mode_returns_cleaned_frames() {
    let options = FrameOptions {
        max_rows_per_sheet: 12,
        sheet_names: Some(vec!["Sales".to_string()]),
    };
    let frames = loader().load_frames(&sales_workbook(20), &options).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].sheet, "Sales");
    // 12 raw rows, one of them blank
    assert_eq!(frames[0].frame.shape(), (11, 2));
}

#[test]
fn test_preview_of_empty_sheets() {
    let previews = loader().load_previews(&sparse_workbook(), &preview_options(5, 10)).unwrap();
    assert_eq!(previews.len(), 2);

    let blank = &previews[0];
    assert_eq!(blank.sheet, "Blank");
    assert!(blank.columns.is_empty());
    assert_eq!(blank.total_rows, 0);
    assert!(!blank.truncated);
    assert!(blank.preview_rows.is_empty());
    assert_eq!(blank.sample_row_count, 0);

    let header_only = &previews[1];
    assert_eq!(header_only.columns, vec!["a", "b"]);
    assert_eq!(header_only.total_rows, 0);
    assert!(!header_only.truncated);
    assert!(header_only.preview_rows.is_empty());
}

#[test]
fn test_frames_of_empty_sheets() {
    let options = FrameOptions {
        max_rows_per_sheet: 10,
        sheet_names: None,
    };
    let frames = loader().load_frames(&sparse_workbook(), &options).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].frame.shape(), (0, 0));
    assert_eq!(frames[1].frame.shape(), (0, 2));
}

#[tokio::test]
async fn test_ml_profile_of_empty_sheets() {
    let queue = ProcessingQueue::start(2);
    let pipeline = PipelineConfig::default();

    let response = assert_ok!(
        profile_workbook(&queue, &pipeline, Bytes::from(sparse_workbook()), request(None), None).await
    );
    let names: Vec<&str> = response.sheets.iter().map(|s| s.sheet.as_str()).collect();
    assert_eq!(names, vec!["Blank", "HeaderOnly"]);
    for sheet in &response.sheets {
        assert!(sheet.missingness.is_empty());
        assert!(sheet.outliers.is_empty());
        assert!(sheet.feature_names.is_empty());
        assert!(sheet.feature_preview.is_empty());
        assert!(sheet.pipeline_steps.is_empty());
    }

    queue.shutdown().await;
}

#[tokio::test]
async fn test_preview_and_normalize_through_queue() {
    let queue = ProcessingQueue::start(4);
    let pipeline = PipelineConfig::default();
    let bytes = Bytes::from(sales_workbook(20));

    let preview = assert_ok!(preview_workbook(&queue, &pipeline, bytes.clone(), request(None)).await);
    assert_eq!(preview.filename, "sales.xlsx");
    assert_eq!(preview.total_sheets, 2);
    assert_eq!(preview.total_rows_estimate, Some(22));
    let nav = preview.navigation.unwrap();
    assert_eq!(nav.current, "Sales");
    assert_eq!(nav.next.as_deref(), Some("Notes"));

    let normalized = assert_ok!(normalize_workbook(&queue, &pipeline, bytes, request(Some("Notes"))).await);
    assert_eq!(normalized.sheets.keys().collect::<Vec<_>>(), vec!["Notes"]);
    assert_eq!(normalized.sheets.get("Notes").unwrap().len(), 2);
    let meta = normalized.metadata.get("Notes").unwrap();
    assert_eq!(meta.total_rows, 2);
    assert!(!meta.truncated);
    let nav = normalized.navigation.unwrap();
    assert_eq!(nav.available, vec!["Notes"]);
    assert_eq!(nav.previous, None);

    queue.shutdown().await;
}

#[tokio::test]
async fn test_ml_profile_through_queue() {
    let queue = ProcessingQueue::start(4);
    let pipeline = PipelineConfig::default();
    let bytes = Bytes::from(sales_workbook(40));

    let response = assert_ok!(
        profile_workbook(&queue, &pipeline, bytes, request(Some("Sales")), Some(50)).await
    );
    assert_eq!(response.sheets.len(), 1);
    let sales = &response.sheets[0];
    assert_eq!(sales.sheet, "Sales");
    assert_eq!(sales.missingness.get("Amount"), Some(&0.0));

    assert_eq!(sales.outliers.len(), 1);
    assert_eq!(sales.outliers[0].column, "Amount");
    assert_eq!(sales.outliers[0].capped_values, 1);

    assert_eq!(
        sales.feature_names,
        vec!["numeric__Amount", "categorical__Region_north", "categorical__Region_south"]
    );
    assert_eq!(sales.feature_preview.len(), 25);
    assert_eq!(sales.pipeline_steps.len(), 3);

    queue.shutdown().await;
}

#[tokio::test]
async fn test_ml_sample_rows_out_of_range() {
    let queue = ProcessingQueue::start(1);
    let pipeline = PipelineConfig::default();

    for sample_rows in [10, 10_001] {
        let result = profile_workbook(
            &queue,
            &pipeline,
            Bytes::from(sales_workbook(8)),
            request(None),
            Some(sample_rows),
        )
        .await;
        match result {
            Err(AppError::InvalidInput(msg)) => {
                assert_eq!(msg, "sample_rows must be between 50 and 10000")
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.sheets.len())),
        }
    }
    assert_eq!(queue.pending(), 0);
}
