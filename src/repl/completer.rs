//! Completer for reedline - provides completion suggestions

use std::sync::Arc;

use reedline::{Completer, Span, Suggestion};
use tokio::runtime::Handle;
use tracing::warn;

use crate::completion::{CompletionEngine, CompletionItem, Completions};

/// PromQL completer for reedline
pub struct PromCompleter {
    engine: Arc<CompletionEngine>,
}

impl PromCompleter {
    pub fn new(engine: Arc<CompletionEngine>) -> Self {
        Self { engine }
    }

    /// Run the async engine from reedline's synchronous callback
    fn fetch(&self, line: &str, pos: usize) -> Completions {
        if Handle::try_current().is_err() {
            // No tokio runtime available, nothing to look up with
            return Completions::default();
        }

        let result = tokio::task::block_in_place(|| {
            Handle::current().block_on(self.engine.complete(line, pos))
        });

        match result {
            Ok(completions) => completions,
            Err(e) => {
                warn!("completion failed: {}", e);
                Completions::default()
            }
        }
    }
}

fn to_suggestion(item: CompletionItem, span: Span) -> Suggestion {
    let description = match item.detail {
        Some(detail) => format!("{}: {}", item.kind.as_str(), detail),
        None => item.kind.as_str().to_string(),
    };

    Suggestion {
        value: item.insert_text,
        description: Some(description),
        span,
        append_whitespace: false,
        ..Default::default()
    }
}

impl Completer for PromCompleter {
    /// `pos` is a byte offset into `line`
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let completions = self.fetch(line, pos);
        let span = Span::new(completions.span.start, completions.span.end);

        completions
            .items
            .into_iter()
            .map(|item| to_suggestion(item, span))
            .collect()
    }
}
