// src/tokenize.rs
//! Word extraction shared by title indexing and search queries.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

// \w is Unicode-aware in `regex`, so accented titles tokenize like ASCII ones.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w'-]+").expect("word regex"));

/// Lowercased runs of word characters, apostrophes and hyphens, left to right.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_RE.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Extract words from `text`.
///
/// With `dedupe` every word appears once (order carries no meaning). Without it all words are
/// returned in their original order, repeats included.
pub fn tokenize(text: &str, dedupe: bool) -> Vec<String> {
    if !dedupe {
        return words(text).collect();
    }
    let mut seen = HashSet::new();
    words(text).filter(|w| seen.insert(w.clone())).collect()
}
