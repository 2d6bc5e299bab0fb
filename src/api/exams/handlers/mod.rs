mod create;
mod lookup;
mod manage;

pub(super) use create::publish_exam;
pub(super) use lookup::{get_exam, get_exam_by_pin, list_exams};
pub(super) use manage::{delete_exam, update_exam};
