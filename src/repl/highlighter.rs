//! Syntax highlighter for PromQL
//!
//! Works on the lexer's token spans, so half-typed input highlights the same
//! way it completes. Text between tokens (whitespace, `#` comments) is kept
//! verbatim.

use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::completion::{find_function, is_aggregation, is_keyword};
use crate::parser::{PromLexer, PromToken, PromTokenKind};

/// PromQL syntax highlighter
pub struct PromHighlighter {
    enabled: bool,
}

impl PromHighlighter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn token_style(token: &PromToken, next: Option<&PromToken>) -> Style {
        match &token.kind {
            PromTokenKind::Ident(word) => {
                if is_keyword(word) {
                    Color::Blue.bold()
                } else if is_aggregation(word) {
                    Color::Green.bold()
                } else if find_function(word).is_some()
                    && next.is_some_and(|n| n.kind == PromTokenKind::LParen)
                {
                    Color::Green.normal()
                } else {
                    Style::default()
                }
            }
            PromTokenKind::String {
                terminated: true, ..
            } => Color::Yellow.normal(),
            PromTokenKind::String { .. } => Color::Yellow.italic(),
            PromTokenKind::Number(_) => Color::Purple.normal(),
            PromTokenKind::Duration(_) => Color::Purple.bold(),
            PromTokenKind::Eq
            | PromTokenKind::Neq
            | PromTokenKind::RegexMatch
            | PromTokenKind::RegexNoMatch => Color::Cyan.normal(),
            PromTokenKind::Unknown(_) => Color::Red.normal(),
            kind if kind.is_binary_operator() => Color::Cyan.normal(),
            _ => Style::default(),
        }
    }

    fn push_gap(styled: &mut StyledText, gap: &str) {
        if gap.is_empty() {
            return;
        }
        match gap.find('#') {
            Some(at) => {
                if at > 0 {
                    styled.push((Style::default(), gap[..at].to_string()));
                }
                styled.push((Color::DarkGray.dimmed(), gap[at..].to_string()));
            }
            None => styled.push((Style::default(), gap.to_string())),
        }
    }

    fn highlight_promql(line: &str) -> StyledText {
        let mut styled = StyledText::new();
        let tokens = PromLexer::tokenize(line);
        let mut last_end = 0;

        for (i, token) in tokens.iter().enumerate() {
            if token.is_eof() {
                break;
            }
            Self::push_gap(&mut styled, &line[last_end..token.span.start]);
            let style = Self::token_style(token, tokens.get(i + 1));
            styled.push((style, line[token.span.clone()].to_string()));
            last_end = token.span.end;
        }
        Self::push_gap(&mut styled, &line[last_end..]);

        styled
    }
}

impl Default for PromHighlighter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Highlighter for PromHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        if !self.enabled {
            let mut styled = StyledText::new();
            styled.push((Style::default(), line.to_string()));
            return styled;
        }
        Self::highlight_promql(line)
    }
}
