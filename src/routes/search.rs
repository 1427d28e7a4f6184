use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::SearchResult,
    routes::AppState,
    services,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

/// Handler for the work search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> AppResult<Json<SearchResult>> {
    // A malformed query string (such as a repeated `q`) is reported like a missing one
    let query = params
        .ok()
        .and_then(|Query(params)| params.q)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Query parameter required".to_string()))?;

    tracing::info!(
        request_id = %request_id,
        query = %query,
        "Processing search request"
    );

    let result = services::resolve_work(
        &state.cache,
        state.generator.as_ref(),
        state.posters.as_ref(),
        &query,
    )
    .await?;

    Ok(Json(result))
}

/// CORS preflight: empty 200
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
