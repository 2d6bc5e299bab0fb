use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, OkResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let api = state.settings().api();
    let response = RootResponse {
        message: api.project_name.clone(),
        version: api.version.clone(),
        api_prefix: api.prefix.clone(),
    };

    Json(response)
}

/// Liveness probe for the authoring and student clients.
pub(crate) async fn health() -> Json<OkResponse> {
    Json(OkResponse::ok())
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store();
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    match store.ping().await {
        Ok(()) => {
            components.insert(store.backend().to_string(), "healthy".to_string());
        }
        Err(err) => {
            components.insert(store.backend().to_string(), format!("unhealthy: {err}"));
            status = "unhealthy".to_string();
        }
    }

    Json(HealthResponse { service: "pinquiz-api".to_string(), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
