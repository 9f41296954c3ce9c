// src/record.rs
//! One scored article prediction.

use serde::Serialize;
use thiserror::Error;

use crate::tokenize::tokenize;

pub const SEARCH_URL_PREFIX: &str = "https://duckduckgo.com/?q=";

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("invalid score {raw:?} for article {title:?}")]
    InvalidScore { raw: String, title: String },
}

/// Immutable article record. Serializes to the JSON shape the UI consumes:
/// `{title, link, source, score, linkWillSearch}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    title: String,
    link: String,
    source: String,
    score: f64,
    link_will_search: bool,
}

impl ArticleRecord {
    /// An empty `link` is replaced by a search URL built from source and title.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
        score: f64,
    ) -> Self {
        let title = title.into();
        let source = source.into();
        let mut link = link.into();

        let link_will_search = link.is_empty();
        if link_will_search {
            link = search_link_for(&source, &title);
        }

        Self {
            title,
            link,
            source,
            score,
            link_will_search,
        }
    }

    /// Like [`ArticleRecord::new`] but with the score still as text, as read from a table.
    pub fn parse(
        title: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
        raw_score: &str,
    ) -> Result<Self, RecordError> {
        let title = title.into();
        let score = raw_score
            .trim()
            .parse::<f64>()
            .map_err(|_| RecordError::InvalidScore {
                raw: raw_score.to_string(),
                title: title.clone(),
            })?;
        Ok(Self::new(title, link, source, score))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// True when `link` points at a search rather than the article itself.
    pub fn link_will_search(&self) -> bool {
        self.link_will_search
    }

    pub fn title_words(&self, dedupe: bool) -> Vec<String> {
        tokenize(&self.title, dedupe)
    }
}

/// Search URL used when the original article link is unknown.
pub fn search_link_for(source: &str, title: &str) -> String {
    let query_source = source.replace(' ', "+");
    let query_title = tokenize(title, false).join("+");
    format!("{SEARCH_URL_PREFIX}{query_source}+{query_title}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_link_is_kept() {
        let r = ArticleRecord::new("Some title", "https://npr.org/a", "NPR", 0.5);
        assert_eq!(r.link(), "https://npr.org/a");
        assert!(!r.link_will_search());
    }

    #[test]
    fn empty_link_becomes_search() {
        let r = ArticleRecord::new("Rates rise, rates fall", "", "Fox News", 0.9);
        assert!(r.link_will_search());
        assert_eq!(
            r.link(),
            "https://duckduckgo.com/?q=Fox+News+rates+rise+rates+fall"
        );
    }

    #[test]
    fn parse_accepts_padded_float() {
        let r = ArticleRecord::parse("t", "l", "CNN", " 0.25 ").unwrap();
        assert_eq!(r.score(), 0.25);
    }

    #[test]
    fn parse_rejects_garbage_score() {
        let err = ArticleRecord::parse("t", "", "CNN", "high").unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidScore {
                raw: "high".into(),
                title: "t".into()
            }
        );
    }

    #[test]
    fn empty_title_and_source_are_allowed() {
        let r = ArticleRecord::new("", "", "", 0.0);
        assert_eq!(r.link(), "https://duckduckgo.com/?q=+");
    }

    #[test]
    fn serializes_camel_case_flag() {
        let r = ArticleRecord::new("A b", "", "NPR", 0.75);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["title"], "A b");
        assert_eq!(v["source"], "NPR");
        assert_eq!(v["score"], 0.75);
        assert_eq!(v["linkWillSearch"], true);
        assert_eq!(v["link"], "https://duckduckgo.com/?q=NPR+a+b");
    }
}
