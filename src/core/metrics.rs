use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn exam_published(backend: &'static str) {
    metrics::counter!("exams_published_total", "backend" => backend).increment(1);
}

pub(crate) fn result_submitted(backend: &'static str) {
    metrics::counter!("results_submitted_total", "backend" => backend).increment(1);
}

pub(crate) fn result_rejected(reason: &'static str) {
    metrics::counter!("results_rejected_total", "reason" => reason).increment(1);
}
