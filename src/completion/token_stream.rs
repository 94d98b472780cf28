//! Token stream with cursor awareness for completion
//!
//! Wraps the PromQL tokens of the whole input and splits them around the cursor:
//! the word being typed, the tokens before it and the tokens after it.

use std::ops::Range;

use crate::parser::{PromLexer, PromToken, PromTokenKind};

/// Where the cursor sits relative to the tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorSlot {
    /// Inside or at the end of a word token
    Word(usize),
    /// Inside a quoted string
    String(usize),
    /// Between tokens; the value is the index of the first token after the cursor
    Gap(usize),
}

/// Token stream with cursor position tracking
pub struct TokenStream<'a> {
    text: &'a str,
    /// All tokens (including EOF)
    pub tokens: Vec<PromToken>,
    /// Cursor position (byte index in the original input)
    pub cursor: usize,
    slot: CursorSlot,
}

impl<'a> TokenStream<'a> {
    /// Tokenize `text` and locate `cursor` in it. The cursor is clamped to the
    /// text length and moved back to the nearest char boundary.
    pub fn new(text: &'a str, cursor: usize) -> Self {
        let cursor = clamp_to_char_boundary(text, cursor);
        let tokens = PromLexer::tokenize(text);
        let slot = Self::locate(&tokens, cursor);

        Self {
            text,
            tokens,
            cursor,
            slot,
        }
    }

    fn locate(tokens: &[PromToken], cursor: usize) -> CursorSlot {
        for (i, token) in tokens.iter().enumerate() {
            let span = &token.span;
            if token.is_word() && span.start < cursor && cursor <= span.end {
                return CursorSlot::Word(i);
            }
            if let PromTokenKind::String { terminated, .. } = token.kind {
                let inside = if terminated {
                    cursor < span.end
                } else {
                    cursor <= span.end
                };
                if span.start < cursor && inside {
                    return CursorSlot::String(i);
                }
            }
            if span.end > cursor || token.is_eof() {
                return CursorSlot::Gap(i);
            }
        }
        CursorSlot::Gap(tokens.len().saturating_sub(1))
    }

    /// Tokens that end before the cursor, excluding the word or string at the cursor
    pub fn tokens_before_cursor(&self) -> &[PromToken] {
        let end = match self.slot {
            CursorSlot::Word(i) | CursorSlot::String(i) | CursorSlot::Gap(i) => i,
        };
        &self.tokens[..end]
    }

    /// Tokens after the cursor (and after the word or string at the cursor), without EOF
    pub fn tokens_after_cursor(&self) -> &[PromToken] {
        let start = match self.slot {
            CursorSlot::Word(i) | CursorSlot::String(i) => i + 1,
            CursorSlot::Gap(i) => i,
        };
        let end = self.tokens.len().saturating_sub(1);
        if start >= end {
            return &[];
        }
        &self.tokens[start..end]
    }

    /// Whether the cursor is inside a quoted string
    pub fn in_string(&self) -> bool {
        matches!(self.slot, CursorSlot::String(_))
    }

    /// The text typed so far for the current item: the part of the word before
    /// the cursor, or the string content before the cursor.
    pub fn current_prefix(&self) -> &'a str {
        match self.slot {
            CursorSlot::Word(i) => self.slice(self.tokens[i].span.start, self.cursor),
            // Skip the opening quote
            CursorSlot::String(i) => self.slice(self.tokens[i].span.start + 1, self.cursor),
            CursorSlot::Gap(_) => "",
        }
    }

    /// The range a completion replaces: the whole word around the cursor, the
    /// whole string when the cursor is inside one, otherwise an empty range at
    /// the cursor.
    pub fn completion_span(&self) -> Range<usize> {
        match self.slot {
            CursorSlot::Word(i) | CursorSlot::String(i) => self.tokens[i].span.clone(),
            CursorSlot::Gap(i) => match self.tokens.get(i) {
                // Cursor right before a word still replaces that word
                Some(token) if token.is_word() && token.span.start == self.cursor => {
                    token.span.clone()
                }
                _ => self.cursor..self.cursor,
            },
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.text.get(start..end).unwrap_or("")
    }
}

fn clamp_to_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
