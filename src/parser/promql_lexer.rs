//! PromQL lexer for error-tolerant tokenization
//!
//! The lexer is built for autocomplete: the text it sees is usually half-typed,
//! so it never panics and never rejects input. Unknown characters become
//! `Unknown` tokens, unterminated strings run to the end of input and are flagged.
//!
//! Spans are byte ranges into the original input, so they can be compared
//! directly with an editor's cursor offset.

use std::ops::Range;

/// Token types for PromQL
#[derive(Debug, Clone, PartialEq)]
pub enum PromTokenKind {
    /// Identifier: metric name, label name, function name or keyword
    Ident(String),
    /// Quoted string, with escapes decoded
    String {
        value: String,
        quote: char,
        terminated: bool,
    },
    /// Number literal (`1`, `0.5`, `1e3`, `0x1f`)
    Number(String),
    /// Duration literal (`5m`, `1h30m`, `100ms`)
    Duration(String),
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `=~`
    RegexMatch,
    /// `!~`
    RegexNoMatch,
    /// `==`
    EqEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^`
    Caret,
    /// `@`
    At,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `:` (subquery step separator)
    Colon,
    /// End of input
    EOF,
    /// Unknown character
    Unknown(char),
}

impl PromTokenKind {
    /// Arithmetic and comparison operators. Keyword operators (`and`, `or`, ...)
    /// are identifiers and are checked separately.
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            PromTokenKind::Plus
                | PromTokenKind::Minus
                | PromTokenKind::Star
                | PromTokenKind::Slash
                | PromTokenKind::Percent
                | PromTokenKind::Caret
                | PromTokenKind::EqEq
                | PromTokenKind::Neq
                | PromTokenKind::Lt
                | PromTokenKind::Le
                | PromTokenKind::Gt
                | PromTokenKind::Ge
        )
    }

    /// Label matcher operators inside a selector
    pub fn is_match_operator(&self) -> bool {
        matches!(
            self,
            PromTokenKind::Eq
                | PromTokenKind::Neq
                | PromTokenKind::RegexMatch
                | PromTokenKind::RegexNoMatch
        )
    }
}

/// Token with position information
#[derive(Debug, Clone)]
pub struct PromToken {
    pub kind: PromTokenKind,
    pub span: Range<usize>,
}

impl PromToken {
    /// Create a new token
    pub fn new(kind: PromTokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// Identifier text, if this is an identifier
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            PromTokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this token is the given identifier/keyword
    pub fn is_ident(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }

    /// Whether the token is a word the user may be in the middle of typing
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            PromTokenKind::Ident(_) | PromTokenKind::Number(_) | PromTokenKind::Duration(_)
        )
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, PromTokenKind::EOF)
    }
}

/// PromQL lexer - error-tolerant tokenizer
pub struct PromLexer {
    /// Characters paired with their byte offsets
    input: Vec<(usize, char)>,
    /// Byte length of the input
    len: usize,
    pos: usize,
}

impl PromLexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.char_indices().collect(),
            len: input.len(),
            pos: 0,
        }
    }

    /// Tokenize the entire input. The last token is always `EOF`.
    pub fn tokenize(input: &str) -> Vec<PromToken> {
        let mut lexer = Self::new(input);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    fn next_token(&mut self) -> PromToken {
        self.skip_whitespace_and_comments();

        let start = self.byte_pos();

        if self.is_at_end() {
            return PromToken::new(PromTokenKind::EOF, start..start);
        }

        let ch = self.current_char();

        let single = |lexer: &mut Self, kind: PromTokenKind| {
            lexer.advance();
            PromToken::new(kind, start..lexer.byte_pos())
        };

        match ch {
            '(' => single(self, PromTokenKind::LParen),
            ')' => single(self, PromTokenKind::RParen),
            '{' => single(self, PromTokenKind::LBrace),
            '}' => single(self, PromTokenKind::RBrace),
            '[' => single(self, PromTokenKind::LBracket),
            ']' => single(self, PromTokenKind::RBracket),
            ',' => single(self, PromTokenKind::Comma),
            ':' => single(self, PromTokenKind::Colon),
            '@' => single(self, PromTokenKind::At),
            '+' => single(self, PromTokenKind::Plus),
            '-' => single(self, PromTokenKind::Minus),
            '*' => single(self, PromTokenKind::Star),
            '/' => single(self, PromTokenKind::Slash),
            '%' => single(self, PromTokenKind::Percent),
            '^' => single(self, PromTokenKind::Caret),
            '=' => {
                self.advance();
                let kind = match self.current_char() {
                    '=' => {
                        self.advance();
                        PromTokenKind::EqEq
                    }
                    '~' => {
                        self.advance();
                        PromTokenKind::RegexMatch
                    }
                    _ => PromTokenKind::Eq,
                };
                PromToken::new(kind, start..self.byte_pos())
            }
            '!' => {
                self.advance();
                let kind = match self.current_char() {
                    '=' => {
                        self.advance();
                        PromTokenKind::Neq
                    }
                    '~' => {
                        self.advance();
                        PromTokenKind::RegexNoMatch
                    }
                    _ => PromTokenKind::Unknown('!'),
                };
                PromToken::new(kind, start..self.byte_pos())
            }
            '<' | '>' => {
                self.advance();
                let or_equal = self.current_char() == '=';
                if or_equal {
                    self.advance();
                }
                let kind = match (ch, or_equal) {
                    ('<', false) => PromTokenKind::Lt,
                    ('<', true) => PromTokenKind::Le,
                    (_, false) => PromTokenKind::Gt,
                    (_, true) => PromTokenKind::Ge,
                };
                PromToken::new(kind, start..self.byte_pos())
            }
            '"' | '\'' | '`' => self.scan_string(ch, start),
            '0'..='9' => self.scan_number_or_duration(start),
            '.' if self.peek_char().is_ascii_digit() => self.scan_number_or_duration(start),
            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(start),
            _ => single(self, PromTokenKind::Unknown(ch)),
        }
    }

    /// Scan a string literal. Backtick strings are raw (no escapes).
    fn scan_string(&mut self, quote: char, start: usize) -> PromToken {
        self.advance(); // Skip opening quote

        let mut value = String::new();
        let raw = quote == '`';

        while !self.is_at_end() && self.current_char() != quote {
            let ch = self.current_char();
            if ch == '\\' && !raw {
                self.advance();
                if self.is_at_end() {
                    value.push('\\');
                    break;
                }
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(ch);
            }
            self.advance();
        }

        let terminated = !self.is_at_end() && self.current_char() == quote;
        if terminated {
            self.advance();
        }

        PromToken::new(
            PromTokenKind::String {
                value,
                quote,
                terminated,
            },
            start..self.byte_pos(),
        )
    }

    /// Scan a number, or a duration when the digits are followed by a unit
    fn scan_number_or_duration(&mut self, start: usize) -> PromToken {
        let mut value = String::new();

        if self.current_char() == '0' && matches!(self.peek_char(), 'x' | 'X') {
            value.push(self.current_char());
            self.advance();
            value.push(self.current_char());
            self.advance();
            while !self.is_at_end() && self.current_char().is_ascii_hexdigit() {
                value.push(self.current_char());
                self.advance();
            }
            return PromToken::new(PromTokenKind::Number(value), start..self.byte_pos());
        }

        self.take_digits(&mut value);

        if Self::is_duration_unit(self.current_char()) {
            // 1h30m, 100ms, 2d: units and digit runs alternate
            while !self.is_at_end() && self.current_char().is_ascii_alphanumeric() {
                value.push(self.current_char());
                self.advance();
            }
            return PromToken::new(PromTokenKind::Duration(value), start..self.byte_pos());
        }

        if self.current_char() == '.' {
            value.push('.');
            self.advance();
            self.take_digits(&mut value);
        }

        if matches!(self.current_char(), 'e' | 'E')
            && (self.peek_char().is_ascii_digit() || matches!(self.peek_char(), '+' | '-'))
        {
            value.push(self.current_char());
            self.advance();
            if matches!(self.current_char(), '+' | '-') {
                value.push(self.current_char());
                self.advance();
            }
            self.take_digits(&mut value);
        }

        PromToken::new(PromTokenKind::Number(value), start..self.byte_pos())
    }

    fn take_digits(&mut self, value: &mut String) {
        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }
    }

    fn is_duration_unit(ch: char) -> bool {
        matches!(ch, 's' | 'm' | 'h' | 'd' | 'w' | 'y')
    }

    /// Scan an identifier. Colons are allowed after the first character
    /// (recording-rule metric names such as `job:http_requests:rate5m`).
    fn scan_identifier(&mut self, start: usize) -> PromToken {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == ':' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        PromToken::new(PromTokenKind::Ident(value), start..self.byte_pos())
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn current_char(&self) -> char {
        self.input.get(self.pos).map(|(_, c)| *c).unwrap_or('\0')
    }

    fn peek_char(&self) -> char {
        self.input.get(self.pos + 1).map(|(_, c)| *c).unwrap_or('\0')
    }

    /// Byte offset of the current character
    fn byte_pos(&self) -> usize {
        self.input.get(self.pos).map(|(i, _)| *i).unwrap_or(self.len)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<PromTokenKind> {
        PromLexer::tokenize(input)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_selector() {
        let tokens = PromLexer::tokenize(r#"up{job="api"}"#);
        assert_eq!(tokens.len(), 7);
        assert!(tokens[0].is_ident("up"));
        assert!(matches!(tokens[1].kind, PromTokenKind::LBrace));
        assert!(tokens[2].is_ident("job"));
        assert!(matches!(tokens[3].kind, PromTokenKind::Eq));
        assert!(matches!(
            tokens[4].kind,
            PromTokenKind::String { ref value, terminated: true, .. } if value == "api"
        ));
        assert!(matches!(tokens[5].kind, PromTokenKind::RBrace));
        assert!(tokens[6].is_eof());
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = PromLexer::tokenize(r#"{a="é",b=}"#);
        // { a = "é" , b = }
        assert_eq!(tokens[3].span, 3..7); // "é" is two bytes
        assert_eq!(tokens[4].span, 7..8);
        assert!(tokens[5].is_ident("b"));
        assert_eq!(tokens[5].span, 8..9);
    }

    #[test]
    fn test_match_operators() {
        assert_eq!(
            kinds("= != =~ !~ =="),
            vec![
                PromTokenKind::Eq,
                PromTokenKind::Neq,
                PromTokenKind::RegexMatch,
                PromTokenKind::RegexNoMatch,
                PromTokenKind::EqEq,
                PromTokenKind::EOF,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("< <= > >="),
            vec![
                PromTokenKind::Lt,
                PromTokenKind::Le,
                PromTokenKind::Gt,
                PromTokenKind::Ge,
                PromTokenKind::EOF,
            ]
        );
    }

    #[test]
    fn test_durations_and_numbers() {
        assert_eq!(
            kinds("[5m:30s] 1h30m 100ms 0.5 1e3 0x1F"),
            vec![
                PromTokenKind::LBracket,
                PromTokenKind::Duration("5m".to_string()),
                PromTokenKind::Colon,
                PromTokenKind::Duration("30s".to_string()),
                PromTokenKind::RBracket,
                PromTokenKind::Duration("1h30m".to_string()),
                PromTokenKind::Duration("100ms".to_string()),
                PromTokenKind::Number("0.5".to_string()),
                PromTokenKind::Number("1e3".to_string()),
                PromTokenKind::Number("0x1F".to_string()),
                PromTokenKind::EOF,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = PromLexer::tokenize(r#"up{job="ap"#);
        assert!(matches!(
            tokens[4].kind,
            PromTokenKind::String { ref value, terminated: false, .. } if value == "ap"
        ));
        assert_eq!(tokens[4].span.end, 10);
        assert!(tokens[5].is_eof());
    }

    #[test]
    fn test_escapes_and_raw_strings() {
        let tokens = PromLexer::tokenize(r#""a\"b" `c\d`"#);
        assert!(matches!(
            tokens[0].kind,
            PromTokenKind::String { ref value, quote: '"', .. } if value == "a\"b"
        ));
        assert!(matches!(
            tokens[1].kind,
            PromTokenKind::String { ref value, quote: '`', .. } if value == "c\\d"
        ));
    }

    #[test]
    fn test_recording_rule_name() {
        let tokens = PromLexer::tokenize("job:http_requests:rate5m");
        assert!(tokens[0].is_ident("job:http_requests:rate5m"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = PromLexer::tokenize("up # the up metric\n+ 1");
        assert!(tokens[0].is_ident("up"));
        assert!(matches!(tokens[1].kind, PromTokenKind::Plus));
        assert!(matches!(tokens[2].kind, PromTokenKind::Number(ref n) if n == "1"));
    }

    #[test]
    fn test_empty_input() {
        let tokens = PromLexer::tokenize("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
        assert_eq!(tokens[0].span, 0..0);
    }

    #[test]
    fn test_unknown_chars_never_panic() {
        for input in ["!", "\\", "up{$}", "\"\\", "ü€", "9e", "0x", "=~~!"] {
            let tokens = PromLexer::tokenize(input);
            assert!(tokens.last().is_some_and(|t| t.is_eof()));
        }
        assert!(
            kinds("up$")
                .iter()
                .any(|k| matches!(k, PromTokenKind::Unknown('$')))
        );
    }
}
