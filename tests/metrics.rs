// tests/metrics.rs
//
// The Prometheus recorder is process-global, so this binary installs it exactly once.

mod common;

use axum::http::StatusCode;
use tower::ServiceExt as _;

use common::*;
use news_exemplar::build_app;
use news_exemplar::config::AppConfig;

#[tokio::test]
async fn metrics_endpoint_reports_queries() {
    let dir = tempfile::tempdir().unwrap();
    let predictions = dir.path().join("predictions.csv");
    std::fs::write(&predictions, SAMPLE_CSV).unwrap();
    let cfg = AppConfig {
        predictions_path: predictions,
        static_dir: dir.path().to_path_buf(),
        metrics_routes: true,
        ..AppConfig::default()
    };
    let app = build_app(&cfg).unwrap().router;

    let r = app.clone().oneshot(get("/query.json?search=b")).await.unwrap();
    assert_eq!(r.status(), StatusCode::OK);
    let r = app.clone().oneshot(get("/query.json?search=zebra")).await.unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let m = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    let text = body_string(m).await;

    for needle in ["keep_queries_total", "keep_query_empty_total", "keep_records"] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
