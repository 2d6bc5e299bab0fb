mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_exams).post(handlers::publish_exam))
        .route("/pin/:pin", get(handlers::get_exam_by_pin))
        .route(
            "/:exam_id",
            get(handlers::get_exam).put(handlers::update_exam).delete(handlers::delete_exam),
        )
}
