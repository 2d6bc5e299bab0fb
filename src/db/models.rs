use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::schemas::exam::{Exam, ExamSummary};
use crate::schemas::result::Submission;

#[derive(Debug, FromRow)]
pub(crate) struct ExamDocumentRow {
    pub(crate) document: Json<Exam>,
}

#[derive(Debug, FromRow)]
pub(crate) struct ExamSummaryRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) pin: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<ExamSummaryRow> for ExamSummary {
    fn from(row: ExamSummaryRow) -> Self {
        Self { id: row.id, title: row.title, pin: row.pin, created_at: row.created_at }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SubmissionDocumentRow {
    pub(crate) document: Json<Submission>,
}
