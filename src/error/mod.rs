//! Error handling for promsh.
//!
//! A single crate-wide [`PromshError`] wraps the more specific kinds:
//! - [`ConfigError`] for configuration loading and validation
//! - [`IndexError`] for failures reported by a label index (HTTP, API, snapshot)
//!
//! Index errors are never swallowed by the completion resolver; they travel up
//! to the host (REPL or CLI), which decides how to present them.
//!
//! # Example
//!
//! ```rust
//! use promsh::error::{IndexError, PromshError, Result};
//!
//! fn lookup() -> Result<()> {
//!     Err(IndexError::Request("connection refused".to_string()).into())
//! }
//!
//! assert!(matches!(lookup(), Err(PromshError::Index(_))));
//! ```

pub mod kinds;

pub use kinds::{ConfigError, IndexError, PromshError, Result};
