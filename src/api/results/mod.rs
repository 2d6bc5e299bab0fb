mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::submit_result))
        .route("/:exam_id", get(handlers::list_results))
        .route("/:exam_id/csv", get(handlers::export_results_csv))
}
