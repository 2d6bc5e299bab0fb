use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tempfile::TempDir;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::repositories::file::FileStore;

const ENV_VARS: &[&str] = &[
    "PINQUIZ_HOST",
    "PINQUIZ_PORT",
    "PINQUIZ_ENV",
    "ENVIRONMENT",
    "PINQUIZ_STRICT_CONFIG",
    "PINQUIZ_STORAGE",
    "PINQUIZ_DATA_DIR",
    "PINQUIZ_STATIC_DIR",
    "PINQUIZ_LOG_LEVEL",
    "PINQUIZ_LOG_JSON",
    "PROJECT_NAME",
    "VERSION",
    "API_PREFIX",
    "BACKEND_CORS_ORIGINS",
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "POSTGRES_SERVER",
    "POSTGRES_PORT",
    "POSTGRES_USER",
    "POSTGRES_PASSWORD",
    "POSTGRES_DB",
    "PIN_MAX_ATTEMPTS",
    "PROMETHEUS_ENABLED",
];

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    data_dir: TempDir,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn clear_pinquiz_env() {
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
}

impl TestContext {
    pub(crate) fn data_dir(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

pub(crate) async fn setup_test_context() -> TestContext {
    build_test_context(|| {}, None).await
}

/// File-backed app over a fresh temp directory. `configure` runs after the
/// environment is cleared and before settings are loaded.
pub(crate) async fn setup_test_context_with(configure: impl FnOnce()) -> TestContext {
    build_test_context(configure, None).await
}

/// Every PIN the store draws comes from `generate`.
pub(crate) async fn setup_test_context_with_pin_generator(
    generate: fn() -> String,
) -> TestContext {
    build_test_context(|| {}, Some(generate)).await
}

async fn build_test_context(
    configure: impl FnOnce(),
    pin_generator: Option<fn() -> String>,
) -> TestContext {
    let guard = env_lock().await;
    clear_pinquiz_env();

    let data_dir = TempDir::new().expect("temp data dir");
    std::env::set_var("PINQUIZ_ENV", "test");
    std::env::set_var("PINQUIZ_DATA_DIR", data_dir.path());
    configure();

    let settings = Settings::load().expect("settings");
    clear_pinquiz_env();

    let mut store = FileStore::open(data_dir.path(), settings.pins().pin_max_attempts)
        .await
        .expect("file store");
    if let Some(generate) = pin_generator {
        store = store.with_pin_generator(generate);
    }
    let state = AppState::new(settings, Arc::new(store));
    let app = api::router::router(state.clone());

    TestContext { state, app, data_dir, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) fn raw_json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

pub(crate) async fn read_text(response: axum::response::Response<Body>) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
