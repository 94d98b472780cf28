//! promsh - PromQL shell with context-aware autocompletion
//!
//! The completion core works on half-typed PromQL and answers two questions
//! for a cursor position: what kind of value belongs there
//! ([`completion::classify`]) and which concrete items to offer
//! ([`completion::Resolver`]). Metric and label names come from a
//! [`index::LabelIndex`], which may be a live Prometheus server or a JSON
//! snapshot.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `completion`: Cursor classification and completion resolution
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `formatter`: Output formatting and display
//! - `history`: Query history
//! - `index`: Metric and label name sources
//! - `parser`: PromQL tokenization
//! - `repl`: Interactive REPL engine
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, RwLock};
//! use promsh::{CompletionEngine, history::QueryHistory, index::StaticIndex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let index = Arc::new(StaticIndex::load("snapshot.json")?);
//!     let history = Arc::new(RwLock::new(QueryHistory::new(100)));
//!     let engine = CompletionEngine::new(index, history);
//!
//!     let completions = engine.complete("rate(http_requests_total{", 25).await?;
//!     for item in completions.items {
//!         println!("{}", item.label);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod formatter;
pub mod history;
pub mod index;
pub mod parser;
pub mod repl;

// Re-export commonly used types
pub use completion::{CompletionEngine, SuggestionRequest, classify};
pub use config::Config;
pub use error::{PromshError, Result};
pub use formatter::Formatter;
pub use repl::ReplEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
