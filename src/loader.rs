// src/loader.rs
//! Materialize the predictions table into an [`ArticleKeep`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::keep::ArticleKeep;
use crate::record::ArticleRecord;

pub const DEFAULT_PREDICTIONS_PATH: &str = "predictions.csv";

/// One row of the predictions table. Unknown columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRow {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "actualSource")]
    pub source: String,
    // Kept as text so a bad value is reported with its title instead of a serde position.
    pub score: String,
}

/// Build a keep from already-read rows. Any unparseable score fails the whole load.
pub fn keep_from_rows<I>(rows: I) -> Result<ArticleKeep>
where
    I: IntoIterator<Item = PredictionRow>,
{
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            ArticleRecord::parse(row.title, row.link, row.source, &row.score)
                .with_context(|| format!("predictions row {}", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ArticleKeep::new(records))
}

/// Read CSV predictions (header row required) from any reader.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<PredictionRow>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    for (i, row) in rdr.deserialize::<PredictionRow>().enumerate() {
        rows.push(row.with_context(|| format!("reading predictions row {}", i + 1))?);
    }
    Ok(rows)
}

pub fn load_keep_from_path(path: &Path) -> Result<ArticleKeep> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening predictions at {}", path.display()))?;
    let rows = read_rows(file).with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(target: "keep", path = %path.display(), rows = rows.len(), "predictions loaded");
    keep_from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "title,link,actualSource,score,extra\n\
        title 1 a,,NPR,0.75,x\n\
        title 2 b,https://npr.org/2,NPR,0.5,y\n\
        title 3 a,,CNN,0.25,z\n";

    #[test]
    fn reads_rows_and_builds_keep() {
        let rows = read_rows(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].link, "https://npr.org/2");
        assert_eq!(rows[2].source, "CNN");

        let keep = keep_from_rows(rows).unwrap();
        assert_eq!(keep.len(), 3);
        assert_eq!(keep.prototypical().len(), 2);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let with_bom = format!("\u{feff}{CSV}");
        let rows = read_rows(with_bom.as_bytes()).unwrap();
        assert_eq!(rows[0].title, "title 1 a");
    }

    #[test]
    fn bad_score_fails_whole_load() {
        let csv = "title,link,actualSource,score\nok,,NPR,0.1\nbad,,CNN,oops\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        let err = keep_from_rows(rows).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("oops"), "{msg}");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_keep_from_path(&dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        std::fs::write(&path, CSV).unwrap();
        let keep = load_keep_from_path(&path).unwrap();
        assert_eq!(keep.query(["a"]).len(), 2);
    }
}
