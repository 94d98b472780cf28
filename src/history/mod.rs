//! Query history
//!
//! Keeps the queries submitted in the shell, most recent first, and feeds them
//! to the completion resolver. When backed by a file, entries are stored as
//! JSON lines in chronological order so recording a query is a single append.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// One previously run query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastQuery {
    /// Query text; entries imported from elsewhere may lack one
    #[serde(default)]
    pub expr: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PastQuery {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: Some(expr.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Bounded, most-recent-first list of past queries
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<PastQuery>,
    max_size: usize,
    file: Option<PathBuf>,
}

impl QueryHistory {
    /// In-memory history holding at most `max_size` entries
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size,
            file: None,
        }
    }

    /// History persisted to `path`. Existing entries are loaded; lines that do
    /// not parse are skipped.
    pub fn with_file(path: impl Into<PathBuf>, max_size: usize) -> Result<Self> {
        let path = path.into();
        let mut history = Self::new(max_size);

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let mut loaded = 0usize;
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<PastQuery>(&line) {
                    Ok(entry) => {
                        history.entries.push_front(entry);
                        loaded += 1;
                    }
                    Err(e) => warn!("Skipping malformed history line: {}", e),
                }
            }
            history.entries.truncate(max_size);
            debug!("Loaded {} history entries from {}", loaded, path.display());

            history.file = Some(path);
            // Keep the file from growing without bound
            if loaded > max_size {
                history.save()?;
            }
        } else {
            history.file = Some(path);
        }

        Ok(history)
    }

    /// Record a submitted query. Blank input is ignored.
    pub fn record(&mut self, expr: &str) -> Result<()> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(());
        }

        let entry = PastQuery::new(expr);
        if let Some(path) = &self.file {
            Self::append(path, &entry)?;
        }

        self.entries.push_front(entry);
        self.entries.truncate(self.max_size);
        Ok(())
    }

    /// Entries, most recent first
    pub fn entries(&self) -> Vec<PastQuery> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PastQuery> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Remove all entries (and truncate the backing file)
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    /// Rewrite the backing file from the in-memory entries
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        for entry in self.entries.iter().rev() {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        Ok(())
    }

    fn append(path: &Path, entry: &PastQuery) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exprs(history: &QueryHistory) -> Vec<String> {
        history.iter().filter_map(|q| q.expr.clone()).collect()
    }

    #[test]
    fn test_most_recent_first() {
        let mut history = QueryHistory::new(10);
        history.record("up").unwrap();
        history.record("rate(x[5m])").unwrap();
        assert_eq!(exprs(&history), vec!["rate(x[5m])", "up"]);
    }

    #[test]
    fn test_bounded() {
        let mut history = QueryHistory::new(2);
        for q in ["a", "b", "c"] {
            history.record(q).unwrap();
        }
        assert_eq!(exprs(&history), vec!["c", "b"]);
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut history = QueryHistory::new(10);
        history.record("   ").unwrap();
        history.record("  up  ").unwrap();
        assert_eq!(exprs(&history), vec!["up"]);
    }

    #[test]
    fn test_persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("queries.jsonl");

        let mut history = QueryHistory::with_file(&path, 10).unwrap();
        history.record("up").unwrap();
        history.record("sum(up)").unwrap();

        let reloaded = QueryHistory::with_file(&path, 10).unwrap();
        assert_eq!(exprs(&reloaded), vec!["sum(up)", "up"]);
        assert_eq!(reloaded.file_path(), Some(path.as_path()));
    }

    #[test]
    fn test_load_compacts_and_skips_bad_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queries.jsonl");
        let mut content = String::new();
        for q in ["a", "b", "c"] {
            content.push_str(&serde_json::to_string(&PastQuery::new(q)).unwrap());
            content.push('\n');
        }
        content.push_str("{broken\n");
        content.push_str(r#"{"timestamp":"2024-01-01T00:00:00Z"}"#);
        content.push('\n');
        fs::write(&path, content).unwrap();

        let history = QueryHistory::with_file(&path, 3).unwrap();
        // The entry without an expression is kept, the broken line is not
        assert_eq!(history.len(), 3);
        assert_eq!(history.entries()[0].expr, None);
        assert_eq!(exprs(&history), vec!["c", "b"]);

        let lines = fs::read_to_string(&path).unwrap().lines().count();
        assert_eq!(lines, 3);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queries.jsonl");
        let mut history = QueryHistory::with_file(&path, 10).unwrap();
        history.record("up").unwrap();
        history.clear().unwrap();

        assert!(history.is_empty());
        assert!(QueryHistory::with_file(&path, 10).unwrap().is_empty());
    }
}
