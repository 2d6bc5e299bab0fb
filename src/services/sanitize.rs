use thiserror::Error;

use crate::schemas::exam::{
    ChoiceOption, ExamCreate, ExamPatch, ExamSettings, ExamUpdate, MatchPair, NewExam, Question,
    QuestionKind, UNTITLED_EXAM,
};
use crate::schemas::result::{Student, Totals};

#[derive(Debug, Error, PartialEq)]
pub(crate) enum SanitizeError {
    #[error("questions must contain at least one question")]
    NoQuestions,
    #[error("question {0} has no text")]
    MissingText(usize),
    #[error("question {0} needs at least one non-empty option")]
    MissingOptions(usize),
    #[error("question {0} needs at least one accepted answer")]
    MissingAccepted(usize),
    #[error("question {0} needs at least one item to order")]
    MissingItems(usize),
    #[error("question {0} needs at least one complete pair")]
    MissingPairs(usize),
    #[error("question {0} has a non-finite numeric value")]
    NotFinite(usize),
    #[error("student.name must not be empty")]
    MissingStudentName,
    #[error("totals must be finite and non-negative")]
    InvalidTotals,
}

pub(crate) fn sanitize_new_exam(payload: ExamCreate) -> Result<NewExam, SanitizeError> {
    let settings = payload
        .settings
        .map(|input| input.apply_to(&ExamSettings::default()))
        .unwrap_or_default();

    Ok(NewExam {
        title: sanitize_title(payload.title.as_deref()),
        description: payload
            .description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        settings,
        questions: sanitize_questions(payload.questions)?,
    })
}

pub(crate) fn sanitize_patch(payload: ExamUpdate) -> Result<ExamPatch, SanitizeError> {
    let questions = match payload.questions {
        Some(questions) => Some(sanitize_questions(questions)?),
        None => None,
    };

    Ok(ExamPatch {
        title: payload.title.as_deref().map(|title| sanitize_title(Some(title))),
        description: payload.description.map(|value| value.trim().to_string()),
        settings: payload.settings,
        questions,
    })
}

/// Trims free text, drops blank entries and clamps negative numbers. Fails when
/// a question has nothing a student could answer.
pub(crate) fn sanitize_questions(questions: Vec<Question>) -> Result<Vec<Question>, SanitizeError> {
    if questions.is_empty() {
        return Err(SanitizeError::NoQuestions);
    }

    questions
        .into_iter()
        .enumerate()
        .map(|(index, question)| sanitize_question(index + 1, question))
        .collect()
}

fn sanitize_question(number: usize, question: Question) -> Result<Question, SanitizeError> {
    let text = question.text.trim().to_string();
    if text.is_empty() {
        return Err(SanitizeError::MissingText(number));
    }

    let points = match question.points {
        Some(points) if !points.is_finite() => return Err(SanitizeError::NotFinite(number)),
        Some(points) => Some(points.max(0.0)),
        None => None,
    };

    let kind = match question.kind {
        QuestionKind::MultipleChoice { options } => {
            let options: Vec<ChoiceOption> = options
                .into_iter()
                .map(|option| ChoiceOption { text: option.text.trim().to_string(), ..option })
                .filter(|option| !option.text.is_empty())
                .collect();
            if options.is_empty() {
                return Err(SanitizeError::MissingOptions(number));
            }
            QuestionKind::MultipleChoice { options }
        }
        QuestionKind::TrueFalse { answer } => QuestionKind::TrueFalse { answer },
        QuestionKind::ShortAnswer { accepted, case_sensitive } => {
            let accepted = non_blank(accepted);
            if accepted.is_empty() {
                return Err(SanitizeError::MissingAccepted(number));
            }
            QuestionKind::ShortAnswer { accepted, case_sensitive }
        }
        QuestionKind::Numeric { answer, tolerance } => {
            if !answer.is_finite() || !tolerance.is_finite() {
                return Err(SanitizeError::NotFinite(number));
            }
            QuestionKind::Numeric { answer, tolerance: tolerance.max(0.0) }
        }
        QuestionKind::LongAnswer { rubric } => QuestionKind::LongAnswer {
            rubric: rubric.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()),
        },
        QuestionKind::Ordering { items } => {
            let items = non_blank(items);
            if items.is_empty() {
                return Err(SanitizeError::MissingItems(number));
            }
            QuestionKind::Ordering { items }
        }
        QuestionKind::Matching { pairs } => {
            let pairs: Vec<MatchPair> = pairs
                .into_iter()
                .map(|pair| MatchPair {
                    left: pair.left.trim().to_string(),
                    right: pair.right.trim().to_string(),
                })
                .filter(|pair| !pair.left.is_empty() && !pair.right.is_empty())
                .collect();
            if pairs.is_empty() {
                return Err(SanitizeError::MissingPairs(number));
            }
            QuestionKind::Matching { pairs }
        }
    };

    Ok(Question { text, points, kind })
}

pub(crate) fn sanitize_student(student: Student) -> Result<Student, SanitizeError> {
    let name = student.name.trim().to_string();
    if name.is_empty() {
        return Err(SanitizeError::MissingStudentName);
    }
    Ok(Student { name, group: student.group.trim().to_string() })
}

pub(crate) fn sanitize_totals(totals: Option<Totals>) -> Result<Totals, SanitizeError> {
    let totals = totals.unwrap_or_default();
    let valid = [totals.score, totals.max].iter().all(|value| value.is_finite() && *value >= 0.0);
    if !valid {
        return Err(SanitizeError::InvalidTotals);
    }
    Ok(totals)
}

fn sanitize_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => UNTITLED_EXAM.to_string(),
    }
}

fn non_blank(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::exam::ExamSettingsInput;

    fn mc(text: &str, options: &[(&str, bool)]) -> Question {
        Question {
            text: text.to_string(),
            points: None,
            kind: QuestionKind::MultipleChoice {
                options: options
                    .iter()
                    .map(|(text, correct)| ChoiceOption {
                        text: text.to_string(),
                        correct: *correct,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn new_exam_gets_default_title_and_settings() {
        let draft = sanitize_new_exam(ExamCreate {
            title: Some("   ".to_string()),
            description: None,
            settings: Some(ExamSettingsInput { time: Some(20), ..Default::default() }),
            questions: vec![mc("2+2?", &[("4", true)])],
        })
        .expect("draft");

        assert_eq!(draft.title, UNTITLED_EXAM);
        assert_eq!(draft.settings, ExamSettings { show_score: true, shuffle: false, time: 20 });
    }

    #[test]
    fn empty_question_list_is_rejected() {
        assert_eq!(sanitize_questions(Vec::new()), Err(SanitizeError::NoQuestions));
    }

    #[test]
    fn blank_options_are_dropped() {
        let questions = sanitize_questions(vec![mc(" 2+2? ", &[(" ", false), (" 4 ", true)])])
            .expect("questions");
        assert_eq!(questions[0], mc("2+2?", &[("4", true)]));
    }

    #[test]
    fn options_that_are_all_blank_are_rejected() {
        let err = sanitize_questions(vec![mc("ok", &[("4", true)]), mc("2+2?", &[("", true)])])
            .expect_err("no options");
        assert_eq!(err, SanitizeError::MissingOptions(2));
    }

    #[test]
    fn question_without_text_is_rejected() {
        let err = sanitize_questions(vec![mc("  ", &[("4", true)])]).expect_err("no text");
        assert_eq!(err, SanitizeError::MissingText(1));
    }

    #[test]
    fn numeric_tolerance_and_points_are_clamped() {
        let questions = sanitize_questions(vec![Question {
            text: "Pi".to_string(),
            points: Some(-3.0),
            kind: QuestionKind::Numeric { answer: 3.14, tolerance: -0.01 },
        }])
        .expect("questions");
        assert_eq!(questions[0].points, Some(0.0));
        assert_eq!(questions[0].kind, QuestionKind::Numeric { answer: 3.14, tolerance: 0.0 });
    }

    #[test]
    fn positive_tolerance_is_kept() {
        let questions = sanitize_questions(vec![Question {
            text: "Pi".to_string(),
            points: Some(2.0),
            kind: QuestionKind::Numeric { answer: 3.14, tolerance: 0.5 },
        }])
        .expect("questions");
        assert_eq!(questions[0].kind, QuestionKind::Numeric { answer: 3.14, tolerance: 0.5 });
    }

    #[test]
    fn short_answer_without_accepted_values_is_rejected() {
        let question = |accepted: &[&str]| Question {
            text: "Capital de França".to_string(),
            points: None,
            kind: QuestionKind::ShortAnswer {
                accepted: accepted.iter().map(|value| value.to_string()).collect(),
                case_sensitive: false,
            },
        };

        let err = sanitize_questions(vec![question(&[" ", ""])]).expect_err("blank accepted");
        assert_eq!(err, SanitizeError::MissingAccepted(1));

        let questions = sanitize_questions(vec![question(&[" París ", ""])]).expect("questions");
        assert_eq!(
            questions[0].kind,
            QuestionKind::ShortAnswer { accepted: vec!["París".to_string()], case_sensitive: false }
        );
    }

    #[test]
    fn matching_drops_incomplete_pairs() {
        let questions = sanitize_questions(vec![Question {
            text: "Pair".to_string(),
            points: None,
            kind: QuestionKind::Matching {
                pairs: vec![
                    MatchPair { left: "H".to_string(), right: "1".to_string() },
                    MatchPair { left: "O".to_string(), right: " ".to_string() },
                ],
            },
        }])
        .expect("questions");
        let QuestionKind::Matching { pairs } = &questions[0].kind else {
            panic!("expected matching question");
        };
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn patch_keeps_absent_fields_absent() {
        let patch = sanitize_patch(ExamUpdate {
            title: None,
            description: Some("  new  ".to_string()),
            settings: None,
            questions: None,
        })
        .expect("patch");
        assert!(patch.title.is_none());
        assert!(patch.questions.is_none());
        assert_eq!(patch.description.as_deref(), Some("new"));
    }

    #[test]
    fn student_and_totals_are_checked() {
        let student = sanitize_student(Student { name: " Anna ".into(), group: " 1A".into() })
            .expect("student");
        assert_eq!(student, Student { name: "Anna".into(), group: "1A".into() });
        assert_eq!(
            sanitize_student(Student { name: "  ".into(), group: String::new() }),
            Err(SanitizeError::MissingStudentName)
        );
        assert_eq!(sanitize_totals(None), Ok(Totals::default()));
        assert_eq!(
            sanitize_totals(Some(Totals { score: -1.0, max: 2.0 })),
            Err(SanitizeError::InvalidTotals)
        );
    }
}
