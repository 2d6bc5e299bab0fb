pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, config::StorageBackend, state::AppState, telemetry};
use crate::repositories::{file::FileStore, postgres::PgStore, ExamStore};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let store = open_store(&settings).await?;
    tracing::info!(backend = store.backend(), "Exam store ready");

    let state = AppState::new(settings, store);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        api_prefix = %state.settings().api().prefix,
        "PinQuiz API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn ExamStore>> {
    let pin_max_attempts = settings.pins().pin_max_attempts;
    tracing::info!(backend = settings.storage().backend.as_str(), "Opening exam store");

    match settings.storage().backend {
        StorageBackend::File => {
            let data_dir = &settings.storage().data_dir;
            let store = FileStore::open(data_dir, pin_max_attempts).await?;
            tracing::info!(data_dir = %data_dir.display(), "Using file storage");
            Ok(Arc::new(store))
        }
        StorageBackend::Postgres => {
            let pool = db::init_pool(settings).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");
            Ok(Arc::new(PgStore::new(pool, pin_max_attempts)))
        }
    }
}
