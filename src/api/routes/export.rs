//! Export Routes
//!
//! Record export for backup and analysis.
//!
//! - GET /api/v1/export?format=csv|ndjson&start=&end= - Records in ledger order

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::ExportParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::ledger::TimeRange;
use crate::query::{IndexedRecord, RecordFilter};

const CSV_HEADER: [&str; 15] = [
    "index",
    "timestamp",
    "source",
    "temperature",
    "humidity",
    "density",
    "conductivity",
    "weight",
    "volume",
    "ph",
    "color",
    "available_stock",
    "state",
    "action",
    "integrity_tag",
];

/// GET /api/v1/export
pub async fn export_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    if !state.config.enable_export {
        return Err(ApiError::Validation("Export feature is disabled".to_string()));
    }

    let format = params.format.to_lowercase();
    let (content_type, extension) = match format.as_str() {
        "csv" => ("text/csv", "csv"),
        "ndjson" => ("application/x-ndjson", "ndjson"),
        other => {
            return Err(ApiError::Validation(format!(
                "Unsupported export format: {}",
                other
            )))
        }
    };

    let mut filter = RecordFilter::new();
    if params.start.is_some() || params.end.is_some() {
        filter = filter.range(TimeRange::from_bounds(params.start, params.end)?);
    }
    let records = state.queries.filter_indexed(&filter);

    let body = match extension {
        "csv" => format_csv(&records)?,
        _ => format_ndjson(&records)?,
    };

    tracing::info!(records = records.len(), format = %format, "Exported records");

    let filename = format!(
        "chemledger_export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        extension
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response())
}

/// Format as CSV
fn format_csv(records: &[IndexedRecord]) -> ApiResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_api = |e: csv::Error| ApiError::Internal(format!("CSV encoding failed: {}", e));

    writer.write_record(CSV_HEADER).map_err(to_api)?;

    for IndexedRecord { index, record } in records {
        writer
            .write_record([
                index.to_string(),
                record.timestamp.to_string(),
                record.source.to_string(),
                record.temperature.to_string(),
                record.humidity.to_string(),
                record.density.to_string(),
                record.conductivity.to_string(),
                record.weight.to_string(),
                record.volume.to_string(),
                record.ph.to_string(),
                record.color.to_string(),
                record.available_stock.to_string(),
                record.state.to_string(),
                record.action.to_string(),
                record.integrity_tag.clone().unwrap_or_default(),
            ])
            .map_err(to_api)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Internal(e.to_string()))
}

/// Format as newline-delimited JSON
fn format_ndjson(records: &[IndexedRecord]) -> ApiResult<String> {
    let mut ndjson = String::new();

    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| ApiError::Internal(format!("JSON encoding failed: {}", e)))?;
        ndjson.push_str(&line);
        ndjson.push('\n');
    }

    Ok(ndjson)
}
