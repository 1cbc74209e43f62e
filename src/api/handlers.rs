use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::error::RiskError;

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(error: &RiskError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, message) = match error {
        RiskError::Validation { .. } => (StatusCode::BAD_REQUEST, error.to_string()),
        // Degradation handles dependency failures inside the pipeline;
        // anything surfacing here is a programming error.
        _ => {
            tracing::error!(error = %error, "Internal error during assessment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: message,
            kind: error.kind(),
        }),
    )
}

pub async fn assess(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssessRequest>,
) -> ApiResult<AssessResponse> {
    let transaction = request.into_transaction().map_err(|e| api_error(&e))?;
    state
        .pipeline
        .assess(&transaction)
        .await
        .map(|assessment| Json(assessment.into()))
        .map_err(|e| api_error(&e))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model = state.pipeline.model_snapshot();
    let watchlist = state.pipeline.watchlist_snapshot();
    Json(HealthResponse {
        status: "ok".to_string(),
        model_version: model.version.clone(),
        model_fitted_at: model.fitted_at,
        watchlist_version: watchlist.version.clone(),
        watchlist_addresses: watchlist.address_count(),
    })
}
