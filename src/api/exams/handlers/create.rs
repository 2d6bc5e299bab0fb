use axum::{extract::State, Json};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::schemas::exam::{ExamCreate, ExamPublishedResponse};
use crate::services::sanitize;

pub(in crate::api::exams) async fn publish_exam(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExamCreate>,
) -> Result<Json<ExamPublishedResponse>, ApiError> {
    payload.validate()?;
    let draft = sanitize::sanitize_new_exam(payload)?;

    let exam_id = Uuid::new_v4().to_string();
    let store = state.store();
    let exam = store
        .insert_exam(&exam_id, draft, now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish exam"))?;

    metrics::exam_published(store.backend());
    let kinds: Vec<&str> = exam.questions.iter().map(|question| question.kind.tag()).collect();
    tracing::info!(
        exam_id = %exam.id,
        pin = %exam.pin,
        question_types = ?kinds,
        action = "exam_publish",
        "Exam published"
    );

    Ok(Json(ExamPublishedResponse { exam_id: exam.id, pin: exam.pin }))
}
