//! Label index backed by a Prometheus-compatible HTTP API

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{LabelIndex, METRIC_NAME_LABEL, MetricMetadata, MetricsMetadata, SeriesLabels};
use crate::error::{IndexError, PromshError, Result};

/// Standard response envelope of the Prometheus HTTP API
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_error(self) -> PromshError {
        IndexError::Api {
            error_type: self.error_type.unwrap_or_else(|| "error".to_string()),
            error: self.error.unwrap_or_default(),
        }
        .into()
    }

    fn into_data(self) -> Result<T> {
        if self.status != "success" {
            return Err(self.into_error());
        }
        self.data
            .ok_or_else(|| IndexError::Decode("response has no data".to_string()).into())
    }
}

#[derive(Debug, Deserialize)]
struct BuildInfo {
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQueryData {
    result_type: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: Option<(f64, String)>,
    values: Option<Vec<(f64, String)>>,
}

/// One series (or scalar) of an instant query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub metric: BTreeMap<String, String>,
    /// `(unix timestamp, value)` pairs; a single pair for instant vectors
    pub values: Vec<(f64, String)>,
}

impl Sample {
    /// Series identifier in PromQL notation, e.g. `up{job="api"}`
    pub fn series_name(&self) -> String {
        let name = self
            .metric
            .get(METRIC_NAME_LABEL)
            .map(String::as_str)
            .unwrap_or("");
        let labels: Vec<String> = self
            .metric
            .iter()
            .filter(|(k, _)| k.as_str() != METRIC_NAME_LABEL)
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect();
        if labels.is_empty() && !name.is_empty() {
            name.to_string()
        } else {
            format!("{name}{{{}}}", labels.join(", "))
        }
    }
}

/// Result of an instant query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// `vector`, `matrix`, `scalar` or `string`
    pub result_type: String,
    pub samples: Vec<Sample>,
}

impl QueryResult {
    fn from_raw(raw: RawQueryData) -> Result<Self> {
        let decode = |e: serde_json::Error| IndexError::Decode(e.to_string());
        let samples = match raw.result_type.as_str() {
            "vector" | "matrix" => {
                let series: Vec<RawSeries> = serde_json::from_value(raw.result).map_err(decode)?;
                series
                    .into_iter()
                    .map(|s| Sample {
                        metric: s.metric,
                        values: s.values.unwrap_or_default().into_iter().chain(s.value).collect(),
                    })
                    .collect()
            }
            _ => {
                let point: (f64, String) = serde_json::from_value(raw.result).map_err(decode)?;
                vec![Sample {
                    metric: BTreeMap::new(),
                    values: vec![point],
                }]
            }
        };
        Ok(Self {
            result_type: raw.result_type,
            samples,
        })
    }
}

/// Cache for metric metadata
struct MetadataCache {
    metadata: Option<MetricsMetadata>,
    /// When the cache was last updated; `None` until the first fetch
    last_fetch: Option<Instant>,
    ttl: Duration,
}

impl MetadataCache {
    fn new(ttl: Duration) -> Self {
        Self {
            metadata: None,
            last_fetch: None,
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        self.last_fetch.is_some_and(|t| t.elapsed() < self.ttl)
    }

    fn update(&mut self, metadata: Option<MetricsMetadata>) {
        self.metadata = metadata;
        self.last_fetch = Some(Instant::now());
    }
}

/// Label index that queries a Prometheus server
pub struct PrometheusIndex {
    http: reqwest::Client,
    base_url: String,
    /// How far back series lookups reach
    lookback: Duration,
    metadata_cache: RwLock<MetadataCache>,
}

impl PrometheusIndex {
    /// Create an index for the server at `base_url` (e.g. `http://localhost:9090`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("promsh/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            lookback: Duration::from_secs(12 * 60 * 60),
            metadata_cache: RwLock::new(MetadataCache::new(Duration::from_secs(60))),
        })
    }

    /// Set the series lookup window
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Set how long fetched metadata is reused
    pub fn with_metadata_ttl(mut self, ttl: Duration) -> Self {
        self.metadata_cache = RwLock::new(MetadataCache::new(ttl));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Server version, used as a connectivity check
    pub async fn build_info(&self) -> Result<String> {
        let info: BuildInfo = self.get("/api/v1/status/buildinfo", &[]).await?;
        Ok(info.version)
    }

    /// Evaluate `expr` at the current time
    pub async fn instant_query(&self, expr: &str) -> Result<QueryResult> {
        let raw: RawQueryData = self
            .get("/api/v1/query", &[("query", expr.to_string())])
            .await?;
        QueryResult::from_raw(raw)
    }

    /// Drop cached metadata so the next lookup refetches it
    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.metadata_cache.write() {
            cache.last_fetch = None;
        }
    }

    fn time_window(&self) -> [(&'static str, String); 2] {
        let end = Utc::now().timestamp();
        let start = end - self.lookback.as_secs() as i64;
        [("start", start.to_string()), ("end", end.to_string())]
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prometheus reports query errors as JSON with a 4xx/5xx status
            if let Ok(api) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body) {
                if api.status == "error" {
                    return Err(api.into_error());
                }
            }
            return Err(IndexError::Status {
                code: status.as_u16(),
                body: body.trim().to_string(),
            }
            .into());
        }

        let api: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| IndexError::Decode(e.to_string()))?;
        api.into_data()
    }
}

#[async_trait]
impl LabelIndex for PrometheusIndex {
    async fn metrics_metadata(&self) -> Result<Option<MetricsMetadata>> {
        if let Ok(cache) = self.metadata_cache.read() {
            if cache.is_valid() {
                debug!("metadata cache hit");
                return Ok(cache.metadata.clone());
            }
        }

        let raw: HashMap<String, Vec<MetricMetadata>> = self.get("/api/v1/metadata", &[]).await?;
        let metadata: MetricsMetadata = raw
            .into_iter()
            .map(|(name, entries)| (name, entries.into_iter().next().unwrap_or_default()))
            .collect();
        debug!("fetched metadata for {} metrics", metadata.len());

        let metadata = Some(metadata);
        if let Ok(mut cache) = self.metadata_cache.write() {
            cache.update(metadata.clone());
        }
        Ok(metadata)
    }

    async fn series_labels(&self, selector: &str) -> Result<SeriesLabels> {
        let [start, end] = self.time_window();
        let query = [("match[]", selector.to_string()), start, end];
        let series: Vec<BTreeMap<String, String>> = self.get("/api/v1/series", &query).await?;

        let mut labels = SeriesLabels::new();
        for s in &series {
            super::collect_series(&mut labels, s);
        }
        debug!("{} series, {} labels for {}", series.len(), labels.len(), selector);
        Ok(labels)
    }

    async fn label_names(&self) -> Result<Vec<String>> {
        let [start, end] = self.time_window();
        let names: Vec<String> = self.get("/api/v1/labels", &[start, end]).await?;
        Ok(names
            .into_iter()
            .filter(|n| n != METRIC_NAME_LABEL)
            .collect())
    }

    async fn label_values(&self, name: &str) -> Result<Vec<String>> {
        let [start, end] = self.time_window();
        let path = format!("/api/v1/label/{name}/values");
        self.get(&path, &[start, end]).await
    }
}
