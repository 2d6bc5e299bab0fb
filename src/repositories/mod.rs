pub(crate) mod file;
pub(crate) mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::schemas::exam::{Exam, ExamPatch, ExamSummary, NewExam};
use crate::schemas::result::Submission;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not allocate a free PIN after {0} attempts")]
    PinSpaceExhausted(u32),
}

/// Persistence for exams and their append-only result sets.
///
/// Lookups return `Ok(None)` (or `Ok(false)`) for unknown exams; `Err` is
/// reserved for backend failures.
#[async_trait]
pub(crate) trait ExamStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Persists a new exam under `id` with a freshly allocated, unused PIN.
    async fn insert_exam(
        &self,
        id: &str,
        draft: NewExam,
        now: OffsetDateTime,
    ) -> Result<Exam, StoreError>;

    /// Newest first.
    async fn list_exams(&self) -> Result<Vec<ExamSummary>, StoreError>;

    async fn find_exam(&self, id: &str) -> Result<Option<Exam>, StoreError>;

    async fn find_exam_by_pin(&self, pin: &str) -> Result<Option<Exam>, StoreError>;

    async fn update_exam(
        &self,
        id: &str,
        patch: ExamPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Exam>, StoreError>;

    /// Removes the exam and every submission recorded for it.
    async fn delete_exam(&self, id: &str) -> Result<bool, StoreError>;

    /// Returns `false` when the exam no longer exists.
    async fn append_result(&self, exam_id: &str, item: Submission) -> Result<bool, StoreError>;

    /// Submissions in the order they were appended.
    async fn list_results(&self, exam_id: &str) -> Result<Vec<Submission>, StoreError>;
}
