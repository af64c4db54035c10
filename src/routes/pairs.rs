use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::{AppState, SortField, SortOrder};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring over title or ISO date
    pub filter: Option<String>,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

/// Today's pair, created on first access.
#[instrument(skip(state))]
pub async fn daily_pair(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let pair = state.pair_service.get_or_create_daily_pair().await?;
    Ok(Json(pair))
}

/// A fresh pair from a random archive record.
#[instrument(skip(state))]
pub async fn random_pair(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let pair = state.pair_service.create_random_pair().await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

#[instrument(skip(state))]
pub async fn list_pairs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let pairs = state
        .pair_service
        .list_pairs(params.filter.as_deref(), params.sort, params.order)
        .await?;
    Ok(Json(pairs))
}

#[instrument(skip(state))]
pub async fn delete_pair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.pair_service.delete_pair(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
