//! Output formatting for promsh
//!
//! Renders completions, classification results, query results and the query
//! history in the configured [`OutputFormat`].

mod json;
mod table;

pub use json::JsonFormatter;
pub use table::{TableFormatter, TableStyle};

use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::completion::{Completions, SuggestionRequest};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::history::PastQuery;
use crate::index::QueryResult;

/// Main formatter
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// Enable colored output
    use_colors: bool,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    /// * `use_colors` - Enable colored output
    pub fn new(format_type: OutputFormat, use_colors: bool) -> Self {
        Self {
            format_type,
            use_colors,
        }
    }

    fn json(&self) -> Option<JsonFormatter> {
        match self.format_type {
            OutputFormat::Json => Some(JsonFormatter::new(false, self.use_colors)),
            OutputFormat::JsonPretty => Some(JsonFormatter::new(true, self.use_colors)),
            OutputFormat::Table | OutputFormat::Compact => None,
        }
    }

    fn table(&self) -> TableFormatter {
        TableFormatter::with_colors(self.use_colors)
    }

    /// Format the classification of a cursor position
    pub fn format_request(&self, request: Option<&SuggestionRequest>) -> Result<String> {
        if let Some(json) = self.json() {
            return json.format(&request);
        }

        let Some(request) = request else {
            return Ok("(no suggestion)".to_string());
        };

        let mut rows = vec![vec!["type".to_string(), request.name().to_string()]];
        match request {
            SuggestionRequest::LabelNamesForSelector {
                metric_name,
                other_labels,
            }
            | SuggestionRequest::LabelNamesForBy {
                metric_name,
                other_labels,
            } => {
                rows.push(metric_row(metric_name.as_deref()));
                rows.push(labels_row(other_labels));
            }
            SuggestionRequest::LabelValues {
                metric_name,
                label_name,
                other_labels,
            } => {
                rows.push(metric_row(metric_name.as_deref()));
                rows.push(vec!["label".to_string(), label_name.clone()]);
                rows.push(labels_row(other_labels));
            }
            SuggestionRequest::AllDurations
            | SuggestionRequest::AllMetricNames
            | SuggestionRequest::AllMetricAndFunctionNames
            | SuggestionRequest::AllMetricAndFunctionNamesAndHistory => {}
        }

        if self.format_type == OutputFormat::Compact {
            return Ok(rows
                .into_iter()
                .map(|r| r.join(": "))
                .collect::<Vec<_>>()
                .join("\n"));
        }
        Ok(self.table().format(&["field", "value"], rows, ""))
    }

    /// Format a completion list
    pub fn format_completions(&self, completions: &Completions) -> Result<String> {
        if let Some(json) = self.json() {
            return json.format(&json!({
                "span": [completions.span.start, completions.span.end],
                "request": completions.request,
                "items": completions.items,
            }));
        }

        if self.format_type == OutputFormat::Compact {
            return Ok(completions
                .items
                .iter()
                .map(|i| i.insert_text.as_str())
                .collect::<Vec<_>>()
                .join("\n"));
        }

        let rows = completions
            .items
            .iter()
            .map(|item| {
                vec![
                    item.label.clone(),
                    item.insert_text.clone(),
                    item.kind.as_str().to_string(),
                    item.detail.clone().unwrap_or_default(),
                ]
            })
            .collect();
        Ok(self.table().format(
            &["label", "insert", "kind", "detail"],
            rows,
            "(no completions)",
        ))
    }

    /// Format the result of an instant query
    pub fn format_query_result(&self, result: &QueryResult) -> Result<String> {
        if let Some(json) = self.json() {
            return json.format(result);
        }

        if self.format_type == OutputFormat::Compact {
            return Ok(result
                .samples
                .iter()
                .map(|s| format!("{} {}", s.series_name(), last_value(&s.values)))
                .collect::<Vec<_>>()
                .join("\n"));
        }

        let rows = result
            .samples
            .iter()
            .map(|s| {
                let (timestamp, value) = s
                    .values
                    .last()
                    .map(|(ts, v)| (format_timestamp(*ts), v.clone()))
                    .unwrap_or_default();
                vec![s.series_name(), value, timestamp]
            })
            .collect();
        Ok(self
            .table()
            .format(&["series", "value", "timestamp"], rows, "(empty result)"))
    }

    /// Format the query history, most recent first
    pub fn format_history(&self, history: &[PastQuery]) -> Result<String> {
        if let Some(json) = self.json() {
            return json.format(history);
        }

        let rows = history
            .iter()
            .enumerate()
            .filter_map(|(i, q)| {
                let expr = q.expr.clone()?;
                Some(vec![
                    (i + 1).to_string(),
                    q.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    expr,
                ])
            })
            .collect::<Vec<_>>();

        if self.format_type == OutputFormat::Compact {
            return Ok(rows
                .into_iter()
                .map(|r| r[2].clone())
                .collect::<Vec<_>>()
                .join("\n"));
        }
        Ok(self
            .table()
            .format(&["#", "time", "query"], rows, "(no history)"))
    }
}

fn metric_row(metric_name: Option<&str>) -> Vec<String> {
    vec!["metric".to_string(), metric_name.unwrap_or("-").to_string()]
}

fn labels_row(labels: &[crate::completion::Label]) -> Vec<String> {
    let text = labels
        .iter()
        .map(|l| format!("{}{}\"{}\"", l.name, l.op, l.value))
        .collect::<Vec<_>>()
        .join(", ");
    vec!["other labels".to_string(), text]
}

fn last_value(values: &[(f64, String)]) -> &str {
    values.last().map(|(_, v)| v.as_str()).unwrap_or("")
}

fn format_timestamp(ts: f64) -> String {
    let secs = ts.trunc() as i64;
    let nanos = (ts.fract() * 1e9) as u32;
    match Utc.timestamp_opt(secs, nanos) {
        chrono::LocalResult::Single(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => ts.to_string(),
    }
}
