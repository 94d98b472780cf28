//! Completion request and item definitions
//!
//! A [`SuggestionRequest`] describes what kind of completion the cursor position
//! calls for. The set of variants is closed; every consumer matches on it
//! exhaustively.

use std::fmt;

use serde::Serialize;

/// Label matcher operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MatchOp {
    /// `=`
    #[default]
    #[serde(rename = "=")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
    /// `=~`
    #[serde(rename = "=~")]
    RegexMatch,
    /// `!~`
    #[serde(rename = "!~")]
    RegexNoMatch,
}

impl MatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::RegexMatch => "=~",
            MatchOp::RegexNoMatch => "!~",
        }
    }
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label matcher already present in a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub name: String,
    pub value: String,
    pub op: MatchOp,
}

impl Label {
    /// Create an equality matcher
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            op: MatchOp::Equal,
        }
    }

    /// Create a matcher with an explicit operator
    pub fn with_op(name: impl Into<String>, op: MatchOp, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            op,
        }
    }
}

/// What kind of completion the cursor position calls for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SuggestionRequest {
    /// Range or offset duration
    AllDurations,

    /// Metric names only (aggregation argument slot)
    AllMetricNames,

    /// Metric names and functions (operand of a binary expression, function argument)
    AllMetricAndFunctionNames,

    /// Metric names, functions and recently run queries (start of the query)
    AllMetricAndFunctionNamesAndHistory,

    /// Label name inside `{...}`
    LabelNamesForSelector {
        metric_name: Option<String>,
        other_labels: Vec<Label>,
    },

    /// Label name inside `by (...)` or `without (...)`
    LabelNamesForBy {
        metric_name: Option<String>,
        other_labels: Vec<Label>,
    },

    /// Label value after a match operator
    LabelValues {
        metric_name: Option<String>,
        label_name: String,
        other_labels: Vec<Label>,
    },
}

impl SuggestionRequest {
    /// Short name of the variant, for logs and table output
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllDurations => "AllDurations",
            Self::AllMetricNames => "AllMetricNames",
            Self::AllMetricAndFunctionNames => "AllMetricAndFunctionNames",
            Self::AllMetricAndFunctionNamesAndHistory => "AllMetricAndFunctionNamesAndHistory",
            Self::LabelNamesForSelector { .. } => "LabelNamesForSelector",
            Self::LabelNamesForBy { .. } => "LabelNamesForBy",
            Self::LabelValues { .. } => "LabelValues",
        }
    }
}

/// Kind of a completion item, for host display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Metric,
    Function,
    History,
    Duration,
    LabelName,
    LabelValue,
}

impl CompletionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionKind::Metric => "metric",
            CompletionKind::Function => "function",
            CompletionKind::History => "history",
            CompletionKind::Duration => "duration",
            CompletionKind::LabelName => "label",
            CompletionKind::LabelValue => "value",
        }
    }
}

/// A single completion suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    /// Text shown in the completion list
    pub label: String,
    /// Text inserted when the item is accepted
    pub insert_text: String,
    /// Whether accepting this item should immediately open the next completion list
    pub retrigger_on_insert: bool,
    pub kind: CompletionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CompletionItem {
    /// Item whose inserted text equals its label
    pub fn simple(text: impl Into<String>, kind: CompletionKind) -> Self {
        let text = text.into();
        Self {
            label: text.clone(),
            insert_text: text,
            retrigger_on_insert: false,
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }
}
