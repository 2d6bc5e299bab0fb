use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::exam::{Exam, ExamSummary, StudentExamResponse};
use crate::services::pins;

pub(in crate::api::exams) async fn list_exams(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummary>>, ApiError> {
    let exams = state
        .store()
        .list_exams()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams))
}

pub(in crate::api::exams) async fn get_exam_by_pin(
    Path(pin): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StudentExamResponse>, ApiError> {
    if !pins::is_valid_pin(&pin) {
        return Err(exam_not_found());
    }

    let exam = state
        .store()
        .find_exam_by_pin(&pin)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(exam_not_found)?;

    Ok(Json(exam.into()))
}

pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Exam>, ApiError> {
    let exam = state
        .store()
        .find_exam(&exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(exam_not_found)?;

    Ok(Json(exam))
}

fn exam_not_found() -> ApiError {
    ApiError::NotFound("Exam not found".to_string())
}
