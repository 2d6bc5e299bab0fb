use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct Student {
    #[serde(default)]
    #[validate(length(min = 1, message = "student.name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct Totals {
    #[serde(default)]
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) max: f64,
}

impl Totals {
    /// `None` when `max` is zero so no division happens.
    pub(crate) fn percentage(&self) -> Option<f64> {
        if self.max == 0.0 {
            return None;
        }
        Some(self.score / self.max * 100.0)
    }
}

/// One answer as graded by the student client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ResponseItem {
    #[serde(default)]
    pub(crate) answer: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) correct: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultCreate {
    #[serde(default)]
    #[validate(length(min = 1, message = "examId is required"))]
    pub(crate) exam_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "pin is required"))]
    pub(crate) pin: String,
    #[validate(required(message = "student is required"), nested)]
    pub(crate) student: Option<Student>,
    #[serde(default)]
    pub(crate) totals: Option<Totals>,
    #[validate(required(message = "responses is required"))]
    pub(crate) responses: Option<Vec<ResponseItem>>,
}

/// Stored submission. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) student: Student,
    pub(crate) totals: Totals,
    pub(crate) responses: Vec<ResponseItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) submitted_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultSet {
    pub(crate) exam_id: String,
    #[serde(default)]
    pub(crate) items: Vec<Submission>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultCreatedResponse {
    pub(crate) ok: bool,
    pub(crate) result_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_responses_fails_validation() {
        let payload: ResultCreate = serde_json::from_value(json!({
            "examId": "e1",
            "pin": "123456",
            "student": {"name": "Anna", "group": "1A"}
        }))
        .expect("payload");
        let err = payload.validate().expect_err("responses missing");
        assert!(err.to_string().contains("responses"));
    }

    #[test]
    fn missing_student_name_fails_validation() {
        let payload: ResultCreate = serde_json::from_value(json!({
            "examId": "e1",
            "pin": "123456",
            "student": {"group": "1A"},
            "responses": []
        }))
        .expect("payload");
        assert!(payload.validate().is_err());
    }

    #[test]
    fn percentage_skips_zero_max() {
        assert_eq!(Totals { score: 3.0, max: 0.0 }.percentage(), None);
        assert_eq!(Totals { score: 3.0, max: 4.0 }.percentage(), Some(75.0));
    }

    #[test]
    fn response_without_flag_omits_correct() {
        let item = ResponseItem { answer: json!("B"), correct: None };
        assert_eq!(serde_json::to_value(&item).unwrap(), json!({"answer": "B"}));
    }
}
