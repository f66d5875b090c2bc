//! Record Routes
//!
//! - POST /api/v1/records - Append a record (owner only)
//! - GET /api/v1/records - Filtered listing
//! - GET /api/v1/records/count - Number of records
//! - GET /api/v1/records/first?n= - Leading records
//! - GET /api/v1/records/last?n= - Trailing records
//! - GET /api/v1/records/:index - Single record
//! - GET /api/v1/records/:index/view/:schema - Record in an older schema

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AppendResponse, CountResponse, FilterParams, LimitParams, RecordsResponse};
use crate::api::error::{ApiError, ApiResult, IDENTITY_HEADER};
use crate::api::state::AppState;
use crate::ledger::{Identity, MeasurementRecord, RecordFields, RecordView, SchemaVersion};

/// Caller identity from the request headers
fn caller(headers: &HeaderMap) -> ApiResult<Identity> {
    let value = headers
        .get(IDENTITY_HEADER)
        .ok_or(ApiError::MissingIdentity)?;
    let id = value
        .to_str()
        .map_err(|_| ApiError::Validation(format!("{} must be visible ASCII", IDENTITY_HEADER)))?;
    Ok(Identity::new(id.trim()))
}

/// POST /api/v1/records
pub async fn append_record(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(fields): Json<RecordFields>,
) -> ApiResult<(StatusCode, Json<AppendResponse>)> {
    let caller = caller(&headers)?;

    // Journal writes may fsync
    let ledger = Arc::clone(&state.ledger);
    let appended = tokio::task::spawn_blocking(move || ledger.append_record(&caller, fields))
        .await
        .map_err(|e| ApiError::Internal(format!("Append task failed: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(AppendResponse {
            index: appended.index,
            low_inventory: appended.low_inventory(),
            events: appended.events,
        }),
    ))
}

/// GET /api/v1/records
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<RecordsResponse>> {
    let filter = params.to_filter()?;
    let records = state.queries.filter_indexed(&filter);

    Ok(Json(RecordsResponse {
        count: records.len(),
        records,
    }))
}

/// GET /api/v1/records/count
pub async fn count_records(State(state): State<Arc<AppState>>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.queries.count(),
    })
}

/// GET /api/v1/records/first
pub async fn first_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<MeasurementRecord>> {
    Json(state.queries.first(params.n))
}

/// GET /api/v1/records/last
pub async fn last_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<MeasurementRecord>> {
    Json(state.queries.last(params.n))
}

/// GET /api/v1/records/:index
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<Json<MeasurementRecord>> {
    Ok(Json(state.queries.get(index)?))
}

/// GET /api/v1/records/:index/view/:schema
pub async fn view_record(
    State(state): State<Arc<AppState>>,
    Path((index, schema)): Path<(usize, String)>,
) -> ApiResult<Json<RecordView>> {
    let schema: SchemaVersion = schema.parse()?;
    Ok(Json(state.ledger.view(index, schema)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(IDENTITY_HEADER, HeaderValue::from_static(" gateway "));
        assert_eq!(caller(&headers).unwrap(), Identity::new("gateway"));
    }

    #[test]
    fn test_caller_missing_header() {
        assert!(matches!(
            caller(&HeaderMap::new()),
            Err(ApiError::MissingIdentity)
        ));
    }
}
