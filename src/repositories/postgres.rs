use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::{ExamStore, StoreError};
use crate::db::models::{ExamDocumentRow, ExamSummaryRow, SubmissionDocumentRow};
use crate::schemas::exam::{Exam, ExamPatch, ExamSummary, NewExam};
use crate::schemas::result::Submission;
use crate::services::pins;

const PIN_CONSTRAINT: &str = "exams_pin_key";

/// Exams and results as JSONB documents. PIN uniqueness is enforced by the
/// `exams_pin_key` constraint; deleting an exam cascades to its results.
pub(crate) struct PgStore {
    pool: PgPool,
    pin_max_attempts: u32,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool, pin_max_attempts: u32) -> Self {
        Self { pool, pin_max_attempts }
    }
}

#[async_trait]
impl ExamStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_exam(
        &self,
        id: &str,
        draft: NewExam,
        now: OffsetDateTime,
    ) -> Result<Exam, StoreError> {
        for attempt in 1..=self.pin_max_attempts {
            let exam = Exam::from_new(id.to_string(), pins::generate_pin(), draft.clone(), now);

            let inserted = sqlx::query(
                "INSERT INTO exams (id, pin, title, document, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&exam.id)
            .bind(&exam.pin)
            .bind(&exam.title)
            .bind(Json(&exam))
            .bind(exam.created_at)
            .bind(exam.updated_at)
            .execute(&self.pool)
            .await;

            match inserted {
                Ok(_) => return Ok(exam),
                Err(err) if is_pin_collision(&err) => {
                    tracing::debug!(attempt, "PIN collision, drawing again");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(StoreError::PinSpaceExhausted(self.pin_max_attempts))
    }

    async fn list_exams(&self) -> Result<Vec<ExamSummary>, StoreError> {
        let rows = sqlx::query_as::<_, ExamSummaryRow>(
            "SELECT id, title, pin, created_at FROM exams ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExamSummary::from).collect())
    }

    async fn find_exam(&self, id: &str) -> Result<Option<Exam>, StoreError> {
        let row = sqlx::query_as::<_, ExamDocumentRow>("SELECT document FROM exams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.document.0))
    }

    async fn find_exam_by_pin(&self, pin: &str) -> Result<Option<Exam>, StoreError> {
        let row =
            sqlx::query_as::<_, ExamDocumentRow>("SELECT document FROM exams WHERE pin = $1")
                .bind(pin)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| row.document.0))
    }

    async fn update_exam(
        &self,
        id: &str,
        patch: ExamPatch,
        now: OffsetDateTime,
    ) -> Result<Option<Exam>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ExamDocumentRow>(
            "SELECT document FROM exams WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut exam = row.document.0;
        exam.apply(patch, now);

        sqlx::query("UPDATE exams SET title = $2, document = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(&exam.title)
            .bind(Json(&exam))
            .bind(exam.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(exam))
    }

    async fn delete_exam(&self, id: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_result(&self, exam_id: &str, item: Submission) -> Result<bool, StoreError> {
        let inserted = sqlx::query(
            "INSERT INTO results (id, exam_id, document, submitted_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&item.id)
        .bind(exam_id)
        .bind(Json(&item))
        .bind(item.submitted_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_results(&self, exam_id: &str) -> Result<Vec<Submission>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionDocumentRow>(
            "SELECT document FROM results WHERE exam_id = $1 ORDER BY seq",
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.document.0).collect())
    }
}

fn is_pin_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(PIN_CONSTRAINT)
        }
        _ => false,
    }
}
