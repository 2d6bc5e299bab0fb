use axum::extract::FromRequest;

use crate::api::errors::ApiError;

/// `axum::Json` whose rejections (bad syntax, wrong field types, unknown
/// question type) become 400 responses in the usual error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub(crate) T);
