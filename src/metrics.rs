use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call at most once per process.
    pub fn init(keep_records: usize) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("keep_queries_total", "Keyword queries answered.");
        describe_counter!(
            "keep_query_empty_total",
            "Keyword queries that matched no article."
        );
        describe_counter!(
            "telemetry_events_written_total",
            "Usage events appended to the usage store."
        );
        describe_counter!(
            "telemetry_events_dropped_total",
            "Usage events dropped because the queue was full or closed."
        );
        describe_counter!(
            "telemetry_write_errors_total",
            "Usage store writes that failed."
        );

        gauge!("keep_records").set(keep_records as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
