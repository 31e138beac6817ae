//! Bulk transfer handlers: batch create, CSV import, exports and template

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use kotoba_common::{BatchCreateRequest, BatchOperationResult, ExportOptions};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::{csv_import, export};
use crate::AppState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEMPLATE_FILENAME: &str = "flashcards_template.csv";

/// File download with `Content-Disposition: attachment`
fn attachment(content_type: &'static str, filename: &str, body: impl IntoResponse) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// POST /api/flashcards/batch
///
/// Per-item failures are reported in the body; the status stays 200.
pub async fn batch_create(
    State(state): State<AppState>,
    Json(request): Json<BatchCreateRequest>,
) -> ApiResult<Json<BatchOperationResult>> {
    if request.flashcards.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one flashcard is required".to_string(),
        ));
    }

    let result = state
        .store
        .create_batch(&request.flashcards, request.options)
        .await;
    info!(
        total = result.total_processed,
        success = result.success_count,
        errors = result.error_count,
        validate_only = request.options.validate_only,
        "Batch create finished"
    );
    Ok(Json(result))
}

/// POST /api/flashcards/import/csv (multipart field `file`)
pub async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<BatchOperationResult>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Could not read upload: {}", e)))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = match upload {
        Some((filename, data)) if !data.is_empty() => (filename, data),
        _ => return Err(ApiError::BadRequest("Please select a CSV file".to_string())),
    };

    if !filename.to_lowercase().ends_with(".csv") {
        warn!(%filename, "Rejected non-CSV upload");
        return Err(ApiError::BadRequest("File must be a CSV file".to_string()));
    }

    info!(%filename, bytes = data.len(), "Importing CSV upload");
    let result = csv_import::import_csv(state.store.as_ref(), &data).await?;
    Ok(Json(result))
}

/// GET /api/flashcards/export/csv
pub async fn export_csv(
    State(state): State<AppState>,
    Query(options): Query<ExportOptions>,
) -> ApiResult<Response> {
    let body = export::export_csv(state.store.as_ref(), &options).await?;
    Ok(attachment(CSV_CONTENT_TYPE, &export::export_filename("csv"), body))
}

/// GET /api/flashcards/export/json
pub async fn export_json(
    State(state): State<AppState>,
    Query(options): Query<ExportOptions>,
) -> ApiResult<Response> {
    let body = export::export_json(state.store.as_ref(), &options).await?;
    Ok(attachment(JSON_CONTENT_TYPE, &export::export_filename("json"), body))
}

/// GET /api/flashcards/template/csv
pub async fn csv_template() -> Response {
    attachment(CSV_CONTENT_TYPE, TEMPLATE_FILENAME, csv_import::CSV_TEMPLATE)
}
