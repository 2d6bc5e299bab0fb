use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

pub(crate) const UNTITLED_EXAM: &str = "(Sense títol)";

/// Presentation settings shown to students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamSettings {
    #[serde(default = "default_true")]
    pub(crate) show_score: bool,
    #[serde(default)]
    pub(crate) shuffle: bool,
    /// Time limit in minutes, 0 means unlimited.
    #[serde(default)]
    pub(crate) time: u32,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self { show_score: true, shuffle: false, time: 0 }
    }
}

/// Partial settings as sent by the authoring client. Missing keys keep their
/// previous value (or the default on publish).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamSettingsInput {
    #[serde(default)]
    pub(crate) show_score: Option<bool>,
    #[serde(default)]
    pub(crate) shuffle: Option<bool>,
    #[serde(default)]
    pub(crate) time: Option<u32>,
}

impl ExamSettingsInput {
    pub(crate) fn apply_to(&self, base: &ExamSettings) -> ExamSettings {
        ExamSettings {
            show_score: self.show_score.unwrap_or(base.show_score),
            shuffle: self.shuffle.unwrap_or(base.shuffle),
            time: self.time.unwrap_or(base.time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChoiceOption {
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MatchPair {
    #[serde(default)]
    pub(crate) left: String,
    #[serde(default)]
    pub(crate) right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Question {
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) points: Option<f64>,
    #[serde(flatten)]
    pub(crate) kind: QuestionKind,
}

/// One variant per question type, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum QuestionKind {
    #[serde(rename = "mc")]
    MultipleChoice {
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    #[serde(rename = "tf")]
    TrueFalse {
        #[serde(default)]
        answer: bool,
    },
    #[serde(rename = "short")]
    ShortAnswer {
        #[serde(default)]
        accepted: Vec<String>,
        #[serde(default, rename = "caseSensitive")]
        case_sensitive: bool,
    },
    #[serde(rename = "num")]
    Numeric {
        answer: f64,
        #[serde(default)]
        tolerance: f64,
    },
    #[serde(rename = "long")]
    LongAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rubric: Option<String>,
    },
    #[serde(rename = "order")]
    Ordering {
        #[serde(default)]
        items: Vec<String>,
    },
    #[serde(rename = "match")]
    Matching {
        #[serde(default)]
        pairs: Vec<MatchPair>,
    },
}

impl QuestionKind {
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            Self::MultipleChoice { .. } => "mc",
            Self::TrueFalse { .. } => "tf",
            Self::ShortAnswer { .. } => "short",
            Self::Numeric { .. } => "num",
            Self::LongAnswer { .. } => "long",
            Self::Ordering { .. } => "order",
            Self::Matching { .. } => "match",
        }
    }
}

/// Publish payload. Identifiers, PIN and timestamps sent by the client have
/// no field here and are dropped during deserialization.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamCreate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) settings: Option<ExamSettingsInput>,
    #[serde(default)]
    #[validate(length(min = 1, message = "questions must contain at least one question"))]
    pub(crate) questions: Vec<Question>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) settings: Option<ExamSettingsInput>,
    #[serde(default)]
    #[validate(length(min = 1, message = "questions must contain at least one question"))]
    pub(crate) questions: Option<Vec<Question>>,
}

/// Sanitized publish payload, ready to receive an id and a PIN.
#[derive(Debug, Clone)]
pub(crate) struct NewExam {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) settings: ExamSettings,
    pub(crate) questions: Vec<Question>,
}

/// Sanitized update payload.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExamPatch {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) settings: Option<ExamSettingsInput>,
    pub(crate) questions: Option<Vec<Question>>,
}

/// Stored exam document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) settings: ExamSettings,
    pub(crate) questions: Vec<Question>,
    pub(crate) pin: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

impl Exam {
    pub(crate) fn from_new(id: String, pin: String, draft: NewExam, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            settings: draft.settings,
            questions: draft.questions,
            pin,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a sanitized patch. `id`, `pin` and `created_at` never change.
    pub(crate) fn apply(&mut self, patch: ExamPatch, now: OffsetDateTime) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description).filter(|value| !value.is_empty());
        }
        if let Some(settings) = patch.settings {
            self.settings = settings.apply_to(&self.settings);
        }
        if let Some(questions) = patch.questions {
            self.questions = questions;
        }
        self.updated_at = now;
    }

    pub(crate) fn summary(&self) -> ExamSummary {
        ExamSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            pin: self.pin.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) pin: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}

/// What a student receives after entering a PIN.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    pub(crate) settings: ExamSettings,
    pub(crate) questions: Vec<Question>,
    pub(crate) pin: String,
}

impl From<Exam> for StudentExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            settings: exam.settings,
            questions: exam.questions,
            pin: exam.pin,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamPublishedResponse {
    pub(crate) exam_id: String,
    pub(crate) pin: String,
}

fn default_true() -> bool {
    true
}
