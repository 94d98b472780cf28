//! Label index: where metric names, label names and label values come from
//!
//! The completion resolver only talks to the [`LabelIndex`] trait. Two backends
//! are provided:
//!
//! - [`PrometheusIndex`] queries a Prometheus-compatible HTTP API
//! - [`StaticIndex`] answers from a JSON snapshot loaded from disk

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

mod prometheus;
mod static_index;

pub use prometheus::{PrometheusIndex, QueryResult, Sample};
pub use static_index::{Snapshot, StaticIndex};

/// Metadata of a single metric
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricMetadata {
    #[serde(rename = "type", default)]
    pub metric_type: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub unit: String,
}

/// Metric name -> metadata
pub type MetricsMetadata = BTreeMap<String, MetricMetadata>;

/// Label name -> distinct values in the order they were first seen.
/// Never contains `__name__`.
pub type SeriesLabels = BTreeMap<String, Vec<String>>;

/// Name of the label that holds the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Source of metric and label information for completions
#[async_trait]
pub trait LabelIndex: Send + Sync {
    /// Metadata of every known metric. `None` when the source has none.
    async fn metrics_metadata(&self) -> Result<Option<MetricsMetadata>>;

    /// Label names and values of the series matching `selector`
    async fn series_labels(&self, selector: &str) -> Result<SeriesLabels>;

    /// Every label name known to the source
    async fn label_names(&self) -> Result<Vec<String>>;

    /// Every value of the label `name` known to the source
    async fn label_values(&self, name: &str) -> Result<Vec<String>>;
}

/// Merge a series' labels into `out`, keeping values unique and in first-seen order
pub(crate) fn collect_series<'a, I>(out: &mut SeriesLabels, series: I)
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    for (name, value) in series {
        if name == METRIC_NAME_LABEL {
            continue;
        }
        let values = out.entry(name.clone()).or_default();
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_series_skips_metric_name() {
        let mut out = SeriesLabels::new();
        let a: BTreeMap<String, String> = [("__name__", "up"), ("job", "api"), ("env", "prod")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let b: BTreeMap<String, String> = [("__name__", "up"), ("job", "db"), ("env", "prod")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        collect_series(&mut out, &a);
        collect_series(&mut out, &b);

        assert!(!out.contains_key("__name__"));
        assert_eq!(out["job"], vec!["api", "db"]);
        assert_eq!(out["env"], vec!["prod"]);
    }

    #[test]
    fn test_metadata_deserializes_type_field() {
        let meta: MetricMetadata =
            serde_json::from_str(r#"{"type":"counter","help":"Requests","unit":""}"#).unwrap();
        assert_eq!(meta.metric_type, "counter");
        assert_eq!(meta.help, "Requests");
    }
}
