//! Completion engine - orchestrates the completion flow
//!
//! Ties the classifier and the resolver together for a host: tokenize, classify
//! the cursor position, resolve items, then compute the range to replace and
//! drop items that do not match what has been typed.

use std::ops::Range;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::classifier::classify_stream;
use super::resolver::Resolver;
use super::situation::{CompletionItem, SuggestionRequest};
use super::token_stream::TokenStream;
use crate::error::Result;
use crate::history::{PastQuery, QueryHistory};
use crate::index::LabelIndex;

/// Characters after which a host should open the completion list on its own
pub const TRIGGER_CHARACTERS: &[char] = &['{', ',', '[', '('];

/// Last characters of the label match operators. Items flagged with
/// `retrigger_on_insert` end with one of these, so a host that opens the
/// list on them also reopens it after such an item is accepted.
pub const RETRIGGER_CHARACTERS: &[char] = &['=', '~'];

/// Result of a completion call
#[derive(Debug, Clone, Default)]
pub struct Completions {
    /// Byte range of the input the chosen item replaces
    pub span: Range<usize>,
    /// What the cursor position was classified as
    pub request: Option<SuggestionRequest>,
    pub items: Vec<CompletionItem>,
}

/// Main completion engine
pub struct CompletionEngine {
    index: Arc<dyn LabelIndex>,
    history: Arc<RwLock<QueryHistory>>,
    resolver: Resolver,
}

impl CompletionEngine {
    /// Create a new completion engine
    ///
    /// # Arguments
    /// * `index` - Source of metric and label names
    /// * `history` - Query history shared with the host
    pub fn new(index: Arc<dyn LabelIndex>, history: Arc<RwLock<QueryHistory>>) -> Self {
        Self {
            index,
            history,
            resolver: Resolver::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Complete `line` at byte offset `pos`
    pub async fn complete(&self, line: &str, pos: usize) -> Result<Completions> {
        let stream = TokenStream::new(line, pos);
        let span = stream.completion_span();

        let Some(request) = classify_stream(&stream) else {
            debug!("no completion at {} in {:?}", stream.cursor, line);
            return Ok(Completions {
                span,
                ..Default::default()
            });
        };
        debug!("suggestion request: {:?}", request);

        let history = self.history_snapshot();
        let mut items = self
            .resolver
            .resolve(&request, self.index.as_ref(), &history)
            .await?;

        let prefix = stream.current_prefix();
        if !prefix.is_empty() {
            items.retain(|item| item.label.starts_with(prefix));
        }

        Ok(Completions {
            span,
            request: Some(request),
            items,
        })
    }

    /// Clone the history so no lock is held while resolving
    fn history_snapshot(&self) -> Vec<PastQuery> {
        match self.history.read() {
            Ok(history) => history.entries(),
            Err(_) => {
                warn!("query history lock poisoned, completing without history");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::StaticIndex;

    const SNAPSHOT: &str = r#"{
        "metadata": {
            "up": {"type": "gauge", "help": "Target is up", "unit": ""},
            "node_cpu_seconds_total": {"type": "counter", "help": "CPU time", "unit": "seconds"}
        },
        "series": [
            {"__name__": "up", "job": "api", "instance": "a:9090"},
            {"__name__": "up", "job": "db", "instance": "b:9090"}
        ]
    }"#;

    fn create_test_engine() -> CompletionEngine {
        let index = Arc::new(StaticIndex::from_json(SNAPSHOT).unwrap());
        let mut history = QueryHistory::new(100);
        history.record("up == 0").unwrap();
        CompletionEngine::new(index, Arc::new(RwLock::new(history)))
    }

    fn labels(completions: &Completions) -> Vec<&str> {
        completions.items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn test_complete_metric_prefix() {
        let engine = create_test_engine();
        let completions = engine.complete("sum(nod", 7).await.unwrap();

        assert_eq!(completions.span, 4..7);
        assert_eq!(labels(&completions), vec!["node_cpu_seconds_total"]);
        assert_eq!(completions.request, Some(SuggestionRequest::AllMetricNames));
    }

    #[tokio::test]
    async fn test_complete_empty_includes_history() {
        let engine = create_test_engine();
        let completions = engine.complete("", 0).await.unwrap();

        assert_eq!(completions.span, 0..0);
        assert_eq!(completions.items.first().map(|i| i.label.as_str()), Some("node_cpu_seconds_total"));
        assert_eq!(completions.items.last().map(|i| i.label.as_str()), Some("up == 0"));
    }

    #[tokio::test]
    async fn test_poisoned_history_is_skipped() {
        let index = Arc::new(StaticIndex::from_json(SNAPSHOT).unwrap());
        let mut history = QueryHistory::new(100);
        history.record("up == 0").unwrap();
        let history = Arc::new(RwLock::new(history));

        let poisoner = history.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the history lock");
        })
        .join();
        assert!(history.is_poisoned());

        let engine = CompletionEngine::new(index, history);
        let completions = engine.complete("", 0).await.unwrap();
        assert!(!completions.items.is_empty());
        assert!(completions.items.iter().all(|i| i.label != "up == 0"));
    }

    #[tokio::test]
    async fn test_complete_function_prefix() {
        let engine = create_test_engine();
        let completions = engine.complete("rat", 3).await.unwrap();
        assert_eq!(labels(&completions), vec!["rate"]);
        assert!(completions.items[0].detail.is_some());
    }

    #[tokio::test]
    async fn test_complete_label_name() {
        let engine = create_test_engine();
        let completions = engine.complete("up{", 3).await.unwrap();

        assert_eq!(completions.span, 3..3);
        assert_eq!(labels(&completions), vec!["instance", "job"]);
        assert_eq!(completions.items[1].insert_text, "job=");
        assert!(completions.items[1].retrigger_on_insert);
        assert!(
            completions
                .items
                .iter()
                .filter(|i| i.retrigger_on_insert)
                .all(|i| i.insert_text.ends_with(RETRIGGER_CHARACTERS))
        );
    }

    #[tokio::test]
    async fn test_complete_label_value_in_quotes() {
        let engine = create_test_engine();
        let line = r#"up{job="a"}"#;
        let completions = engine.complete(line, 9).await.unwrap();

        // Replaces the whole quoted string
        assert_eq!(completions.span, 7..10);
        assert_eq!(labels(&completions), vec!["api"]);
        assert_eq!(completions.items[0].insert_text, "\"api\"");
    }

    #[tokio::test]
    async fn test_complete_label_value_bare() {
        let engine = create_test_engine();
        let completions = engine.complete("up{job=", 7).await.unwrap();
        assert_eq!(labels(&completions), vec!["api", "db"]);
    }

    #[tokio::test]
    async fn test_no_completion_position() {
        let engine = create_test_engine();
        let completions = engine.complete("up ", 3).await.unwrap();
        assert!(completions.request.is_none());
        assert!(completions.items.is_empty());
    }

    #[tokio::test]
    async fn test_durations_in_range() {
        let engine = create_test_engine();
        let completions = engine.complete("rate(up[", 8).await.unwrap();
        assert_eq!(labels(&completions), vec!["5m", "1m", "30s", "15s"]);

        let completions = engine.complete("rate(up[1", 9).await.unwrap();
        assert_eq!(labels(&completions), vec!["1m"]);
        assert_eq!(completions.span, 8..9);
    }
}
