// tests/common/mod.rs
#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{Request, Response},
};
use news_exemplar::{ArticleKeep, ArticleRecord};
use serde_json::Value as Json;

pub const BODY_LIMIT: usize = 1024 * 1024;

pub const SAMPLE_CSV: &str = "title,link,actualSource,score\n\
    title 1 a,,NPR,0.75\n\
    title 2 b,https://npr.org/2,NPR,0.5\n\
    title 3 a,,CNN,0.25\n\
    title 4 b,,CNN,0.1\n";

pub fn sample_keep() -> ArticleKeep {
    ArticleKeep::new(vec![
        ArticleRecord::new("title 1 a", "", "NPR", 0.75),
        ArticleRecord::new("title 2 b", "https://npr.org/2", "NPR", 0.5),
        ArticleRecord::new("title 3 a", "", "CNN", 0.25),
        ArticleRecord::new("title 4 b", "", "CNN", 0.1),
    ])
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET request")
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    String::from_utf8(bytes).expect("utf8")
}

pub async fn body_json(resp: Response<Body>) -> Json {
    serde_json::from_str(&body_string(resp).await).expect("parse json")
}

/// (source, title) pairs in response order.
pub fn source_titles(v: &Json) -> Vec<(String, String)> {
    v["records"]
        .as_array()
        .expect("records array")
        .iter()
        .map(|r| {
            (
                r["source"].as_str().unwrap().to_string(),
                r["title"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}
