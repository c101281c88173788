use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    routing::post,
    Router,
    Json,
    http::Method,
};
use serde::Deserialize;
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::{MlPipelineResponse, NormalizeResponse, PreviewResponse},
    services::file_processor::{self, SheetRequest},
};
use tower_http::cors::{CorsLayer, Any};

const DEFAULT_FILENAME: &str = "upload.xlsx";

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/preview", post(preview_excel))
        .route("/normalize", post(normalize_excel))
        .route("/ml/pipeline", post(ml_pipeline_preview))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    filename: Option<String>,
    sheet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MlQuery {
    filename: Option<String>,
    sheet: Option<String>,
    sample_rows: Option<usize>,
}

fn sheet_request(filename: Option<String>, sheet: Option<String>) -> SheetRequest {
    SheetRequest {
        filename: filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
        sheet,
    }
}

async fn preview_excel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SheetQuery>,
    body: Bytes,
) -> Result<Json<PreviewResponse>, AppError> {
    let request = sheet_request(query.filename, query.sheet);
    let response = file_processor::preview_workbook(&state.queue, &state.config.pipeline, body, request).await?;
    Ok(Json(response))
}

async fn normalize_excel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SheetQuery>,
    body: Bytes,
) -> Result<Json<NormalizeResponse>, AppError> {
    let request = sheet_request(query.filename, query.sheet);
    let response = file_processor::normalize_workbook(&state.queue, &state.config.pipeline, body, request).await?;
    Ok(Json(response))
}

async fn ml_pipeline_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MlQuery>,
    body: Bytes,
) -> Result<Json<MlPipelineResponse>, AppError> {
    let request = sheet_request(query.filename, query.sheet);
    let response = file_processor::profile_workbook(
        &state.queue,
        &state.config.pipeline,
        body,
        request,
        query.sample_rows,
    )
    .await?;
    Ok(Json(response))
}
