//! Aggregate Routes
//!
//! - GET /api/v1/aggregate/average?field=&start=&end= - Integer mean over a time range
//! - GET /api/v1/aggregate/summary?field=&start=&end=&state=&action= - Count, sum, min, max, mean

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{parse_field, AverageParams, AverageResponse, SummaryParams, SummaryResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/aggregate/average
///
/// Open bounds default to the full timestamp range.
pub async fn average(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AverageParams>,
) -> ApiResult<Json<AverageResponse>> {
    let field = parse_field(&params.field)?;
    let start = params.start.unwrap_or(i64::MIN);
    let end = params.end.unwrap_or(i64::MAX);

    let average = state.aggregates.average(field, start, end)?;

    Ok(Json(AverageResponse {
        field,
        average,
        start,
        end,
    }))
}

/// GET /api/v1/aggregate/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> ApiResult<Json<SummaryResponse>> {
    let field = parse_field(&params.field)?;
    let filter = params.filter_params().to_filter()?;

    let summary = state.aggregates.summarize(field, &filter)?;
    Ok(Json(summary.into()))
}
