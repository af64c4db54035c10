use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::services::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub apod_rows: u64,
    pub ai_rows: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.repo.ping().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        apod_rows: state.repo.count_apods().await?,
        ai_rows: state.repo.count_ai_images().await?,
    }))
}
