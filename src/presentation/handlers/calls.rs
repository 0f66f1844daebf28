use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;
use tracing::Instrument;

use crate::application::services::{BatchReport, CallBatchError};
use crate::domain::AudioUpload;
use crate::infrastructure::observability::RequestId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct CallResultResponse {
    pub call_id: String,
    pub transcript: String,
    pub classification: String,
}

#[derive(Serialize)]
pub struct SkippedCallResponse {
    pub call_id: String,
    pub filename: String,
    pub reason: String,
}

#[derive(Serialize)]
pub struct RelocationFailureResponse {
    pub call_id: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub batch_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub results: Vec<CallResultResponse>,
    pub skipped: Vec<SkippedCallResponse>,
    pub relocation_failures: Vec<RelocationFailureResponse>,
    pub persisted: bool,
    pub persistence_error: Option<String>,
}

impl From<BatchReport> for BatchResponse {
    fn from(report: BatchReport) -> Self {
        let persisted = report.persisted();
        Self {
            batch_id: report.batch_id.to_string(),
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.to_rfc3339(),
            results: report
                .results
                .into_iter()
                .map(|r| CallResultResponse {
                    call_id: r.call_id.to_string(),
                    transcript: r.transcript,
                    classification: r.classification,
                })
                .collect(),
            skipped: report
                .skipped
                .into_iter()
                .map(|s| SkippedCallResponse {
                    call_id: s.call_id.to_string(),
                    filename: s.filename,
                    reason: s.reason.to_string(),
                })
                .collect(),
            relocation_failures: report
                .relocation_failures
                .into_iter()
                .map(|f| RelocationFailureResponse {
                    call_id: f.call_id.to_string(),
                    error: f.error,
                })
                .collect(),
            persisted,
            persistence_error: report.persistence_error,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Accepts one or more recordings as multipart file fields and answers once
/// every one of them has been recorded or skipped.
///
/// The batch runs on its own task, so a client that disconnects mid-batch
/// does not cut it short between an upsert and the ledger save.
#[tracing::instrument(skip_all)]
pub async fn process_calls_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Response {
    let mut uploads = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(e.status(), format!("Failed to read multipart: {}", e));
            }
        };

        // Browsers send an unnamed, empty part when no file was picked
        let filename = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => continue,
        };

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, filename = %filename, "Failed to read file bytes");
                return error_response(e.status(), format!("Failed to read {}: {}", filename, e));
            }
        };

        tracing::debug!(filename = %filename, bytes = data.len(), "File received");
        uploads.push(AudioUpload::new(filename, data));
    }

    let service = Arc::clone(&state.call_batch_service);
    let batch = tokio::spawn(
        async move { service.process_batch(uploads).await }.in_current_span(),
    );

    let outcome = match batch.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Call batch task failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Call batch task failed".to_string(),
            );
        }
    };

    match outcome {
        Ok(report) => {
            tracing::info!(
                batch_id = %report.batch_id,
                request_id = %request_id.0,
                "Call batch answered"
            );
            (StatusCode::OK, Json(BatchResponse::from(report))).into_response()
        }
        Err(CallBatchError::Validation(e)) => {
            tracing::warn!(error = %e, "Rejected call batch");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ CallBatchError::LedgerLoad(_)) => {
            tracing::error!(error = %e, "Call batch aborted");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
