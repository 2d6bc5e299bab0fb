use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::schemas::exam::ExamUpdate;
use crate::schemas::OkResponse;
use crate::services::sanitize;

pub(in crate::api::exams) async fn update_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExamUpdate>,
) -> Result<Json<OkResponse>, ApiError> {
    payload.validate()?;
    let patch = sanitize::sanitize_patch(payload)?;

    let updated = state
        .store()
        .update_exam(&exam_id, patch, now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;

    let Some(exam) = updated else {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    };

    tracing::info!(exam_id = %exam.id, action = "exam_update", "Exam updated");

    Ok(Json(OkResponse::ok()))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    let deleted = state
        .store()
        .delete_exam(&exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(exam_id = %exam_id, action = "exam_delete", "Exam deleted with its results");

    Ok(Json(OkResponse::ok()))
}
