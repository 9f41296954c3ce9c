// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod keep;
pub mod loader;
pub mod metrics;
pub mod record;
pub mod telemetry;
pub mod tokenize;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::keep::ArticleKeep;
pub use crate::record::{ArticleRecord, RecordError};
pub use crate::tokenize::tokenize;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::telemetry::{spawn_usage_worker, SqliteSink, UsageWorker};

/// Everything `main` needs to serve: the router plus the telemetry worker to join on shutdown.
pub struct App {
    pub router: axum::Router,
    pub usage_worker: Option<UsageWorker>,
}

/// Explicit startup: build the keep (fail-fast on bad data), then wire optional telemetry and
/// metrics. Must run inside a Tokio runtime when telemetry is configured.
pub fn build_app(cfg: &AppConfig) -> Result<App> {
    let keep = loader::load_keep_from_path(&cfg.predictions_path)?;
    let records = keep.len();
    let mut state = AppState::new(keep, cfg.static_dir.clone());

    let mut usage_worker = None;
    if let Some(t) = &cfg.telemetry {
        match SqliteSink::open(&t.db_path) {
            Ok(sink) => {
                let (reporter, worker) = spawn_usage_worker(sink, t.queue_capacity);
                state = state.with_usage(reporter);
                usage_worker = Some(worker);
                info!(
                    target: "telemetry",
                    db = %t.db_path.display(),
                    capacity = t.queue_capacity,
                    "usage reporting enabled"
                );
            }
            Err(e) => {
                warn!(target: "telemetry", error = %format!("{e:#}"), "usage reporting disabled");
            }
        }
    }

    let mut router = api::router(state);
    if cfg.metrics_routes {
        let m = crate::metrics::Metrics::init(records)?;
        router = router.merge(m.router());
    }

    Ok(App {
        router,
        usage_worker,
    })
}
