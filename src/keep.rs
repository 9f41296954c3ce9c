// src/keep.rs
//! Read-only index over article records: title word -> records, source -> best record.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use crate::record::ArticleRecord;

/// Built once from a finite collection and never mutated afterwards, so a single instance can be
/// shared across request handlers without locking.
#[derive(Debug, Default)]
pub struct ArticleKeep {
    records: Vec<ArticleRecord>,
    // Ingestion positions; ordered sets keep tie-breaking stable (earliest ingested wins).
    index: HashMap<String, BTreeSet<usize>>,
    prototypical: HashMap<String, usize>,
}

impl ArticleKeep {
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ArticleRecord>,
    {
        let mut keep = Self::default();
        for record in records {
            keep.ingest(record);
        }
        tracing::info!(
            target: "keep",
            records = keep.records.len(),
            words = keep.index.len(),
            sources = keep.prototypical.len(),
            "article keep built"
        );
        keep
    }

    fn ingest(&mut self, record: ArticleRecord) {
        let id = self.records.len();

        for word in record.title_words(true) {
            self.index.entry(word).or_default().insert(id);
        }

        match self.prototypical.entry(record.source().to_string()) {
            Entry::Vacant(e) => {
                e.insert(id);
            }
            Entry::Occupied(mut e) => {
                if self.records[*e.get()].score() < record.score() {
                    e.insert(id);
                }
            }
        }

        self.records.push(record);
    }

    /// Best-scoring record per source among records whose title contains every keyword.
    ///
    /// Keywords must already be normalized (see [`crate::tokenize::tokenize`]). No keywords
    /// matches nothing. Result order is unspecified.
    pub fn query<I, S>(&self, keywords: I) -> Vec<&ArticleRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut postings = Vec::new();
        for keyword in keywords {
            match self.index.get(keyword.as_ref()) {
                Some(ids) => postings.push(ids),
                None => return Vec::new(),
            }
        }

        postings.sort_by_key(|ids| ids.len());
        let Some((smallest, rest)) = postings.split_first() else {
            return Vec::new();
        };

        let mut best: HashMap<&str, usize> = HashMap::new();
        for &id in smallest.iter() {
            if !rest.iter().all(|ids| ids.contains(&id)) {
                continue;
            }
            let record = &self.records[id];
            match best.entry(record.source()) {
                Entry::Vacant(e) => {
                    e.insert(id);
                }
                Entry::Occupied(mut e) => {
                    if self.records[*e.get()].score() < record.score() {
                        e.insert(id);
                    }
                }
            }
        }

        best.into_values().map(|id| &self.records[id]).collect()
    }

    /// Highest-scoring record of every source across the whole collection.
    pub fn prototypical(&self) -> Vec<&ArticleRecord> {
        self.prototypical
            .values()
            .map(|&id| &self.records[id])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
