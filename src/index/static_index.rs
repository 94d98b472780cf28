//! Label index answered from a JSON snapshot
//!
//! Snapshot format:
//!
//! ```json
//! {
//!   "metadata": { "up": { "type": "gauge", "help": "Target is up", "unit": "" } },
//!   "series": [ { "__name__": "up", "job": "api", "instance": "a:9090" } ]
//! }
//! ```
//!
//! `metadata` may be omitted, in which case the index reports no metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LabelIndex, METRIC_NAME_LABEL, MetricsMetadata, SeriesLabels, collect_series};
use crate::completion::{Label, MatchOp, selector_labels};
use crate::error::{IndexError, Result};
use crate::parser::{PromLexer, PromTokenKind};

/// On-disk snapshot contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub metadata: Option<MetricsMetadata>,
    #[serde(default)]
    pub series: Vec<BTreeMap<String, String>>,
}

/// A compiled label matcher
struct Matcher {
    name: String,
    op: MatchOp,
    value: String,
    regex: Option<Regex>,
}

impl Matcher {
    fn compile(label: Label) -> Result<Self> {
        let regex = match label.op {
            MatchOp::RegexMatch | MatchOp::RegexNoMatch => {
                // Label regexes are fully anchored
                let re = Regex::new(&format!("^(?:{})$", label.value)).map_err(|e| {
                    IndexError::Api {
                        error_type: "bad_data".to_string(),
                        error: e.to_string(),
                    }
                })?;
                Some(re)
            }
            MatchOp::Equal | MatchOp::NotEqual => None,
        };
        Ok(Self {
            name: label.name,
            op: label.op,
            value: label.value,
            regex,
        })
    }

    fn matches(&self, series: &BTreeMap<String, String>) -> bool {
        // A missing label matches as the empty string
        let actual = series.get(&self.name).map(String::as_str).unwrap_or("");
        match (self.op, &self.regex) {
            (MatchOp::Equal, _) => actual == self.value,
            (MatchOp::NotEqual, _) => actual != self.value,
            (MatchOp::RegexMatch, Some(re)) => re.is_match(actual),
            (MatchOp::RegexNoMatch, Some(re)) => !re.is_match(actual),
            (MatchOp::RegexMatch | MatchOp::RegexNoMatch, None) => false,
        }
    }
}

/// Parse `metric{name="value",...}` into its matchers
fn parse_selector(selector: &str) -> Result<Vec<Label>> {
    let tokens = PromLexer::tokenize(selector);
    let invalid = || IndexError::Api {
        error_type: "bad_data".to_string(),
        error: format!("invalid selector: {selector}"),
    };

    let mut labels = Vec::new();
    let mut rest = &tokens[..];

    if let Some(name) = rest.first().and_then(|t| t.ident()) {
        labels.push(Label::new(METRIC_NAME_LABEL, name));
        rest = &rest[1..];
    }

    match rest.first().map(|t| &t.kind) {
        Some(PromTokenKind::LBrace) => {
            let close = rest
                .iter()
                .position(|t| matches!(t.kind, PromTokenKind::RBrace))
                .ok_or_else(invalid)?;
            labels.extend(selector_labels(&rest[1..close]));
        }
        Some(PromTokenKind::EOF) if !labels.is_empty() => {}
        _ => return Err(invalid().into()),
    }

    Ok(labels)
}

/// Label index backed by a fixed set of series
#[derive(Debug, Clone, Default)]
pub struct StaticIndex {
    snapshot: Snapshot,
}

impl StaticIndex {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a snapshot from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| IndexError::InvalidSnapshot(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            IndexError::InvalidSnapshot(format!("{}: {}", path.display(), e))
        })?;
        let index = Self::from_json(&json)?;
        debug!(
            "loaded {} series from {}",
            index.snapshot.series.len(),
            path.display()
        );
        Ok(index)
    }

    pub fn series_count(&self) -> usize {
        self.snapshot.series.len()
    }

    /// Series matching `selector`
    fn select(&self, selector: &str) -> Result<Vec<&BTreeMap<String, String>>> {
        let matchers = parse_selector(selector)?
            .into_iter()
            .map(Matcher::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(self
            .snapshot
            .series
            .iter()
            .filter(|s| matchers.iter().all(|m| m.matches(s)))
            .collect())
    }
}

#[async_trait]
impl LabelIndex for StaticIndex {
    async fn metrics_metadata(&self) -> Result<Option<MetricsMetadata>> {
        Ok(self.snapshot.metadata.clone())
    }

    async fn series_labels(&self, selector: &str) -> Result<SeriesLabels> {
        let mut labels = SeriesLabels::new();
        for series in self.select(selector)? {
            collect_series(&mut labels, series);
        }
        Ok(labels)
    }

    async fn label_names(&self) -> Result<Vec<String>> {
        let names: BTreeSet<&String> = self
            .snapshot
            .series
            .iter()
            .flat_map(|s| s.keys())
            .filter(|k| k.as_str() != METRIC_NAME_LABEL)
            .collect();
        Ok(names.into_iter().cloned().collect())
    }

    async fn label_values(&self, name: &str) -> Result<Vec<String>> {
        let values: BTreeSet<&String> = self
            .snapshot
            .series
            .iter()
            .filter_map(|s| s.get(name))
            .collect();
        Ok(values.into_iter().cloned().collect())
    }
}
