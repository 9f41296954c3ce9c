use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::get,
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::debug;

use crate::keep::ArticleKeep;
use crate::record::ArticleRecord;
use crate::telemetry::UsageReporter;
use crate::tokenize::tokenize;

/// Page routes and the template each one renders (`<static_dir>/<file>.html`).
pub const PAGES: [(&str, &str); 7] = [
    ("/", "app"),
    ("/code", "code"),
    ("/data", "data"),
    ("/download", "download"),
    ("/privacy", "privacy"),
    ("/terms", "terms"),
    ("/paper", "paper"),
];

#[derive(Clone)]
pub struct AppState {
    keep: Arc<ArticleKeep>,
    usage: Option<UsageReporter>,
    static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(keep: ArticleKeep, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            keep: Arc::new(keep),
            usage: None,
            static_dir: Arc::new(static_dir.into()),
        }
    }

    pub fn with_usage(mut self, usage: UsageReporter) -> Self {
        self.usage = Some(usage);
        self
    }

    fn report(&self, headers: &HeaderMap, page: &str, query: &str) {
        if let Some(usage) = &self.usage {
            let ip = client_ip(headers);
            let agent = header_str(headers, "user-agent").unwrap_or_default();
            usage.report_usage(&ip, agent, page, query);
        }
    }
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(state.static_dir.as_path());

    let mut router = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/prototypical.json", get(prototypical))
        .route("/query.json", get(query));

    for (path, page) in PAGES {
        router = router.route(
            path,
            get(move |State(state): State<AppState>, headers: HeaderMap| async move {
                render_page(&state, &headers, page).await
            }),
        );
    }

    router
        .nest_service("/static", assets)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `{"records": [...]}` as served by the JSON endpoints.
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub records: Vec<ArticleRecord>,
}

impl RecordsResponse {
    /// Order by source so the UI lists publishers alphabetically.
    pub fn sorted(records: Vec<&ArticleRecord>) -> Self {
        let mut records: Vec<ArticleRecord> = records.into_iter().cloned().collect();
        records.sort_by(|a, b| a.source().cmp(b.source()));
        Self { records }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

async fn prototypical(State(state): State<AppState>) -> Json<RecordsResponse> {
    Json(RecordsResponse::sorted(state.keep.prototypical()))
}

async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Json<RecordsResponse> {
    let keywords = tokenize(&params.search, true);
    let found = state.keep.query(&keywords);

    counter!("keep_queries_total").increment(1);
    if found.is_empty() {
        counter!("keep_query_empty_total").increment(1);
    }
    debug!(target: "api", keywords = keywords.len(), results = found.len(), "query");

    state.report(&headers, "query", &params.search);
    Json(RecordsResponse::sorted(found))
}

async fn render_page(
    state: &AppState,
    headers: &HeaderMap,
    page: &str,
) -> Result<Html<String>, StatusCode> {
    let path = state.static_dir.join(format!("{page}.html"));
    let body = tokio::fs::read_to_string(&path).await.map_err(|e| {
        debug!(target: "api", page, path = %path.display(), error = %e, "page not available");
        StatusCode::NOT_FOUND
    })?;
    state.report(headers, page, "");
    Ok(Html(body))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Best-effort client address behind a proxy: first `X-Forwarded-For` hop, then `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let nonblank = |v: &str| -> Option<String> {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    };
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(nonblank)
        .or_else(|| header_str(headers, "x-real-ip").and_then(nonblank))
        .unwrap_or_else(|| "unknown".to_string())
}
