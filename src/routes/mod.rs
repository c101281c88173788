use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use crate::AppState;

pub mod sheets;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(sheets::routes(state.config.max_file_size))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
