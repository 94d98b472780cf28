//! Completion system for PromQL
//!
//! The completion system works on incomplete input and never fails on
//! malformed queries; positions it cannot make sense of produce no suggestions.
//!
//! # Architecture
//!
//! - **TokenStream**: PromQL tokens with cursor awareness
//! - **Classifier**: decides what kind of completion the cursor position calls for
//! - **Resolver**: fetches the candidates for that kind from a label index and the query history
//! - **Engine**: orchestrates the flow for a host and computes the replacement range
//!
//! # Examples
//!
//! ```
//! use promsh::completion::{classify, Label, SuggestionRequest};
//!
//! let request = classify(r#"up{job="api",}"#, 13);
//! assert_eq!(
//!     request,
//!     Some(SuggestionRequest::LabelNamesForSelector {
//!         metric_name: Some("up".to_string()),
//!         other_labels: vec![Label::new("job", "api")],
//!     })
//! );
//! ```

mod classifier;
mod engine;
mod functions;
mod resolver;
mod situation;
mod token_stream;

pub use classifier::{classify, classify_stream};
pub(crate) use classifier::selector_labels;
pub use engine::{CompletionEngine, Completions, RETRIGGER_CHARACTERS, TRIGGER_CHARACTERS};
pub use functions::{
    AGGREGATIONS, FUNCTIONS, FunctionDef, KEYWORDS, find_function, is_aggregation, is_keyword,
};
pub use resolver::{DEFAULT_HISTORY_LIMIT, DURATIONS, Resolver, build_selector, resolve};
pub use situation::{CompletionItem, CompletionKind, Label, MatchOp, SuggestionRequest};
pub use token_stream::TokenStream;
