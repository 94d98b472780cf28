//! Validator for reedline - validates line completeness

use reedline::{ValidationResult, Validator};

use crate::parser::{PromLexer, PromTokenKind};

/// Keeps the editor in multi-line mode while brackets or strings are open
pub struct PromValidator;

impl PromValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check that every bracket is closed and every string terminated
    fn is_balanced(&self, input: &str) -> bool {
        let mut depth: i32 = 0;

        for token in PromLexer::tokenize(input) {
            match token.kind {
                PromTokenKind::LParen | PromTokenKind::LBrace | PromTokenKind::LBracket => {
                    depth += 1
                }
                PromTokenKind::RParen | PromTokenKind::RBrace | PromTokenKind::RBracket => {
                    depth -= 1
                }
                PromTokenKind::String {
                    terminated: false, ..
                } => return false,
                _ => {}
            }
        }

        // Extra closers are a syntax error for the server to report
        depth <= 0
    }
}

impl Default for PromValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for PromValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return ValidationResult::Complete;
        }

        if !self.is_balanced(trimmed) {
            return ValidationResult::Incomplete;
        }

        ValidationResult::Complete
    }
}
