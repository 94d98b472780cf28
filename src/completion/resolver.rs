//! Completion resolver
//!
//! Turns a [`SuggestionRequest`] into an ordered list of [`CompletionItem`]s,
//! consulting the label index and the query history. Index failures are
//! returned as they are; there is no fallback list.

use std::collections::HashSet;

use tracing::debug;

use super::functions::FUNCTIONS;
use super::situation::{CompletionItem, CompletionKind, Label, SuggestionRequest};
use crate::error::Result;
use crate::history::PastQuery;
use crate::index::{LabelIndex, METRIC_NAME_LABEL, SeriesLabels};

/// Durations offered in range and offset positions
pub const DURATIONS: &[&str] = &["5m", "1m", "30s", "15s"];

/// Number of history entries offered by default
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Build the selector used for series lookups:
/// `{__name__="<metric>",<name><op>"<value>",...}`
pub fn build_selector(metric_name: Option<&str>, labels: &[Label]) -> String {
    let metric = metric_name.map(|m| format!("{METRIC_NAME_LABEL}=\"{}\"", escape_value(m)));
    let matchers: Vec<String> = metric
        .into_iter()
        .chain(
            labels
                .iter()
                .map(|l| format!("{}{}\"{}\"", l.name, l.op, escape_value(&l.value))),
        )
        .collect();
    format!("{{{}}}", matchers.join(","))
}

/// Quote-safe form of a decoded label value, the inverse of the lexer's escapes
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Resolver with configurable limits
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    history_limit: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Resolver {
    pub fn new(history_limit: usize) -> Self {
        Self { history_limit }
    }

    /// Produce the completion items for `request`
    pub async fn resolve(
        &self,
        request: &SuggestionRequest,
        index: &dyn LabelIndex,
        history: &[PastQuery],
    ) -> Result<Vec<CompletionItem>> {
        debug!("resolving completions for {:?}", request);

        match request {
            SuggestionRequest::AllDurations => Ok(durations()),
            SuggestionRequest::AllMetricNames => metric_names(index).await,
            SuggestionRequest::AllMetricAndFunctionNames => {
                let mut items = metric_names(index).await?;
                items.extend(functions());
                Ok(items)
            }
            SuggestionRequest::AllMetricAndFunctionNamesAndHistory => {
                let mut items = metric_names(index).await?;
                items.extend(functions());
                items.extend(self.history(history));
                Ok(items)
            }
            SuggestionRequest::LabelNamesForSelector {
                metric_name,
                other_labels,
            } => {
                label_names(index, metric_name.as_deref(), other_labels, "=", true).await
            }
            SuggestionRequest::LabelNamesForBy {
                metric_name,
                other_labels,
            } => label_names(index, metric_name.as_deref(), other_labels, "", false).await,
            SuggestionRequest::LabelValues {
                metric_name,
                label_name,
                other_labels,
            } => label_values(index, metric_name.as_deref(), label_name, other_labels).await,
        }
    }

    /// Most recent distinct expressions, skipping entries without one
    fn history(&self, history: &[PastQuery]) -> Vec<CompletionItem> {
        let mut seen = HashSet::new();
        history
            .iter()
            .filter_map(|q| q.expr.as_deref())
            .filter(|expr| seen.insert(*expr))
            .take(self.history_limit)
            .map(|expr| CompletionItem::simple(expr, CompletionKind::History))
            .collect()
    }
}

/// Resolve with the default limits
pub async fn resolve(
    request: &SuggestionRequest,
    index: &dyn LabelIndex,
    history: &[PastQuery],
) -> Result<Vec<CompletionItem>> {
    Resolver::default().resolve(request, index, history).await
}

fn durations() -> Vec<CompletionItem> {
    DURATIONS
        .iter()
        .map(|d| CompletionItem::simple(*d, CompletionKind::Duration))
        .collect()
}

fn functions() -> impl Iterator<Item = CompletionItem> {
    FUNCTIONS.iter().map(|f| CompletionItem {
        label: f.label.to_string(),
        insert_text: f.insert_text.to_string(),
        retrigger_on_insert: false,
        kind: CompletionKind::Function,
        detail: Some(f.detail.to_string()),
    })
}

async fn metric_names(index: &dyn LabelIndex) -> Result<Vec<CompletionItem>> {
    let Some(metadata) = index.metrics_metadata().await? else {
        return Ok(Vec::new());
    };
    Ok(metadata
        .into_iter()
        .map(|(name, meta)| {
            let detail = (!meta.help.is_empty()).then_some(meta.help);
            CompletionItem::simple(name, CompletionKind::Metric).with_detail(detail)
        })
        .collect())
}

/// Label information for the series selected by metric + labels. With neither,
/// the global label lists are used since an empty selector matches nothing.
async fn lookup_series(
    index: &dyn LabelIndex,
    metric_name: Option<&str>,
    other_labels: &[Label],
    only_label: Option<&str>,
) -> Result<SeriesLabels> {
    if metric_name.is_none() && other_labels.is_empty() {
        let mut labels = SeriesLabels::new();
        match only_label {
            Some(name) => {
                labels.insert(name.to_string(), index.label_values(name).await?);
            }
            None => {
                for name in index.label_names().await? {
                    labels.insert(name, Vec::new());
                }
            }
        }
        return Ok(labels);
    }

    let selector = build_selector(metric_name, other_labels);
    index.series_labels(&selector).await
}

async fn label_names(
    index: &dyn LabelIndex,
    metric_name: Option<&str>,
    other_labels: &[Label],
    suffix: &str,
    retrigger: bool,
) -> Result<Vec<CompletionItem>> {
    let series = lookup_series(index, metric_name, other_labels, None).await?;
    let used: HashSet<&str> = other_labels.iter().map(|l| l.name.as_str()).collect();

    Ok(series
        .into_keys()
        .filter(|name| !used.contains(name.as_str()))
        .map(|name| CompletionItem {
            insert_text: format!("{name}{suffix}"),
            label: name,
            retrigger_on_insert: retrigger,
            kind: CompletionKind::LabelName,
            detail: None,
        })
        .collect())
}

async fn label_values(
    index: &dyn LabelIndex,
    metric_name: Option<&str>,
    label_name: &str,
    other_labels: &[Label],
) -> Result<Vec<CompletionItem>> {
    let mut series = lookup_series(index, metric_name, other_labels, Some(label_name)).await?;
    let values = series.remove(label_name).unwrap_or_default();

    Ok(values
        .into_iter()
        .map(|value| CompletionItem {
            insert_text: format!("\"{value}\""),
            label: value,
            retrigger_on_insert: false,
            kind: CompletionKind::LabelValue,
            detail: None,
        })
        .collect())
}
