use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::analyze::HotReloadWeights;
use crate::catalog::ExistenceOracle;
use crate::engine::{aggregate_trending, AggregatorOptions, TrendingRequest};
use crate::error::AggregateError;
use crate::ingest::types::ProductSource;
use crate::report::AggregationResult;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ProductSource>,
    pub oracle: Arc<dyn ExistenceOracle>,
    pub weights: Arc<HotReloadWeights>,
    pub options: AggregatorOptions,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/trending", post(trending))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        let status = match &self {
            AggregateError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// Malformed bodies get the same `{"error": ...}` 400 as out-of-range values.
impl From<JsonRejection> for AggregateError {
    fn from(rejection: JsonRejection) -> Self {
        AggregateError::invalid("body", rejection.body_text())
    }
}

async fn trending(
    State(state): State<AppState>,
    payload: Result<Json<TrendingRequest>, JsonRejection>,
) -> Result<Json<AggregationResult>, AggregateError> {
    let Json(req) = payload?;
    // Snapshot kept fresh by the weights polling thread.
    let opts = AggregatorOptions {
        default_weights: state.weights.current(),
        ..state.options.clone()
    };
    let result =
        aggregate_trending(state.source.as_ref(), state.oracle.as_ref(), &req, &opts).await?;
    Ok(Json(result))
}
