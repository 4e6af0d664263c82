use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::archive::encode_latin1;
use crate::mail::{Month, YearSummary, merge_summaries};

/// One extracted email, ready to persist.
#[derive(Debug, Clone, Copy)]
pub struct StoredEmail<'a> {
    pub year: u16,
    pub month: Month,
    /// Hex MD5 of the Message-ID
    pub digest: &'a str,
    pub sender: &'a str,
    pub text: &'a str,
}

/// Receives every record that has both a sender and a Message-ID.
pub trait RecordSink: Sync {
    fn accept(&self, email: &StoredEmail<'_>) -> Result<()>;
}

/// Discards records.
pub struct NullSink;

impl RecordSink for NullSink {
    fn accept(&self, _email: &StoredEmail<'_>) -> Result<()> {
        Ok(())
    }
}

/// Writes each record to `<root>/<year>/<Month>/<digest>.eml`.
#[derive(Debug, Clone)]
pub struct EmlWriter {
    root: PathBuf,
}

impl EmlWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, year: u16, month: Month, digest: &str) -> PathBuf {
        self.root
            .join(year.to_string())
            .join(month.name())
            .join(format!("{digest}.eml"))
    }
}

impl RecordSink for EmlWriter {
    fn accept(&self, email: &StoredEmail<'_>) -> Result<()> {
        let path = self.path_for(email.year, email.month, email.digest);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        log::trace!("writing message {}", path.display());
        fs::write(&path, encode_latin1(email.text))
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Receives each year's thread aggregates once the year is complete.
pub trait AggregateSink {
    fn year_complete(&mut self, summary: &YearSummary) -> Result<()>;

    /// Called once after the last year.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// JSON files per year plus merged global files.
pub struct JsonAggregates {
    root: PathBuf,
    summaries: Vec<YearSummary>,
}

pub const GLOBAL_STATS_FILE: &str = "global_thread_stats.json";
pub const GLOBAL_GRAPH_FILE: &str = "global_thread_graph.json";

impl JsonAggregates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            summaries: Vec::new(),
        }
    }
}

impl AggregateSink for JsonAggregates {
    fn year_complete(&mut self, summary: &YearSummary) -> Result<()> {
        let year_dir = self.root.join(summary.year.to_string());
        write_json(&year_dir.join("thread_stats.json"), &summary.stats)?;
        write_json(&year_dir.join("thread_graph.json"), &summary.graph)?;
        self.summaries.push(summary.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let (stats, graph) = merge_summaries(&self.summaries);
        write_json(&self.root.join(GLOBAL_STATS_FILE), &stats)?;
        write_json(&self.root.join(GLOBAL_GRAPH_FILE), &graph)?;
        log::info!(
            "wrote {} threads across {} years to {}",
            graph.len(),
            self.summaries.len(),
            self.root.display()
        );
        Ok(())
    }
}

/// Load merged aggregates written by [`JsonAggregates`].
pub fn load_global(dir: &Path) -> Result<(BTreeMap<String, u64>, BTreeMap<String, Vec<String>>)> {
    let stats = read_json(&dir.join(GLOBAL_STATS_FILE))?;
    let graph = read_json(&dir.join(GLOBAL_GRAPH_FILE))?;
    Ok((stats, graph))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(year: u16, key: &str, senders: &[&str], replies: u64) -> YearSummary {
        let mut s = YearSummary {
            year,
            ..Default::default()
        };
        s.graph
            .insert(key.to_string(), senders.iter().map(|x| x.to_string()).collect());
        if replies > 0 {
            s.stats.insert(key.to_string(), replies);
        }
        s
    }

    #[test]
    fn test_eml_writer_keeps_legacy_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = EmlWriter::new(dir.path());
        let month = Month::new(2).unwrap();
        let email = StoredEmail {
            year: 2009,
            month,
            digest: "abc123",
            sender: "a@x.com",
            text: "From a at x.com\ncaf\u{e9}\n",
        };
        writer.accept(&email).unwrap();

        let path = dir.path().join("2009/February/abc123.eml");
        assert_eq!(writer.path_for(2009, month, "abc123"), path);
        assert_eq!(fs::read(path).unwrap(), b"From a at x.com\ncaf\xe9\n");
    }

    #[test]
    fn test_json_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonAggregates::new(dir.path());
        sink.year_complete(&summary(2007, "2007/January/m1", &["a@x.com", "b@y.com"], 1))
            .unwrap();
        sink.year_complete(&summary(2008, "2008/March/m7", &["c@z.org"], 0))
            .unwrap();
        sink.finish().unwrap();

        let per_year: BTreeMap<String, Vec<String>> =
            read_json(&dir.path().join("2007/thread_graph.json")).unwrap();
        assert_eq!(per_year.len(), 1);

        let (stats, graph) = load_global(dir.path()).unwrap();
        assert_eq!(stats["2007/January/m1"], 1);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph["2008/March/m7"], vec!["c@z.org"]);
    }

    #[test]
    fn test_load_global_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_global(&dir.path().join("nope")).is_err());
    }
}
