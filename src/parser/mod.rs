//! PromQL tokenization
//!
//! The lexer here is the only parsing layer: completion, highlighting and the
//! static index all work on its token stream rather than a full AST, since the
//! text they see is usually unfinished.

mod promql_lexer;

pub use promql_lexer::{PromLexer, PromToken, PromTokenKind};
