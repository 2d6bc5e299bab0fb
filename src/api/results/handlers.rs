use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::schemas::exam::Exam;
use crate::schemas::result::{ResultCreate, ResultCreatedResponse, ResultSet, Submission};
use crate::services::{csv_export, sanitize};

pub(super) async fn submit_result(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResultCreate>,
) -> Result<Json<ResultCreatedResponse>, ApiError> {
    payload.validate()?;
    let ResultCreate { exam_id, pin, student, totals, responses } = payload;
    let (Some(student), Some(responses)) = (student, responses) else {
        return Err(ApiError::BadRequest("student and responses are required".to_string()));
    };

    let store = state.store();
    let exam = require_exam(&state, &exam_id).await?;
    if exam.pin != pin.trim() {
        metrics::result_rejected("pin_mismatch");
        tracing::warn!(exam_id = %exam.id, action = "result_rejected", "PIN does not match exam");
        return Err(ApiError::BadRequest("PIN does not match exam".to_string()));
    }

    let submission = Submission {
        id: Uuid::new_v4().to_string(),
        student: sanitize::sanitize_student(student)?,
        totals: sanitize::sanitize_totals(totals)?,
        responses,
        submitted_at: now_utc(),
    };
    let result_id = submission.id.clone();

    let appended = store
        .append_result(&exam.id, submission)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store result"))?;
    if !appended {
        // Deleted between lookup and append.
        return Err(exam_not_found());
    }

    metrics::result_submitted(store.backend());
    tracing::info!(
        exam_id = %exam.id,
        result_id = %result_id,
        action = "result_submit",
        "Result recorded"
    );

    Ok(Json(ResultCreatedResponse { ok: true, result_id }))
}

pub(super) async fn list_results(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ResultSet>, ApiError> {
    let exam = require_exam(&state, &exam_id).await?;
    let items = state
        .store()
        .list_results(&exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch results"))?;

    Ok(Json(ResultSet { exam_id: exam.id, items }))
}

pub(super) async fn export_results_csv(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let exam = require_exam(&state, &exam_id).await?;
    let items = state
        .store()
        .list_results(&exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch results"))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        csv_export::attachment_filename(&exam.id)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::internal(e, "Invalid attachment filename"))?;

    let mut response = csv_export::render_results(&items).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
    response.headers_mut().insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

async fn require_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    state
        .store()
        .find_exam(exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(exam_not_found)
}

fn exam_not_found() -> ApiError {
    ApiError::NotFound("Exam not found".to_string())
}
