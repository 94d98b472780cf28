//! Cursor classifier
//!
//! Maps a (possibly incomplete) PromQL query and a cursor offset to the kind of
//! completion that position calls for. Classification is pure and synchronous;
//! positions it does not recognise yield `None`.
//!
//! The classifier looks at the innermost bracket that is still open at the
//! cursor and decides from there:
//!
//! - `{`: a selector, so a label name or a label value
//! - `[`: a range or subquery step, so a duration
//! - `(` after `by` / `without`: a grouping label list
//! - `(` otherwise, or no bracket at all: an expression slot

use crate::parser::{PromToken, PromTokenKind};

use super::functions::{is_aggregation, is_keyword};
use super::situation::{Label, MatchOp, SuggestionRequest};
use super::token_stream::TokenStream;

/// Classify the cursor position `offset` (a byte offset) in `text`.
pub fn classify(text: &str, offset: usize) -> Option<SuggestionRequest> {
    let stream = TokenStream::new(text, offset);
    classify_stream(&stream)
}

/// Classify an already-tokenized input
pub fn classify_stream(stream: &TokenStream<'_>) -> Option<SuggestionRequest> {
    let before = stream.tokens_before_cursor();
    let after = stream.tokens_after_cursor();

    let opener = innermost_open_bracket(before);

    // Quoted text only matters as a label value
    if stream.in_string() {
        return match opener {
            Some(o) if matches!(before[o].kind, PromTokenKind::LBrace) => {
                classify_selector(before, o, after)
            }
            _ => None,
        };
    }

    let Some(o) = opener else {
        return classify_expression(before, Slot::TopLevel);
    };

    match before[o].kind {
        PromTokenKind::LBrace => classify_selector(before, o, after),
        PromTokenKind::LBracket => classify_range(&before[o + 1..]),
        PromTokenKind::LParen => classify_paren(before, o, after),
        _ => None,
    }
}

/// What kind of slot an expression sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Not inside any bracket
    TopLevel,
    /// Argument of an aggregation operator
    Aggregation,
    /// Argument of any other function, or a grouping paren
    Other,
}

/* ========================= bracket helpers ========================= */

fn is_opener(kind: &PromTokenKind) -> bool {
    matches!(
        kind,
        PromTokenKind::LParen | PromTokenKind::LBrace | PromTokenKind::LBracket
    )
}

fn closes(opener: &PromTokenKind, closer: &PromTokenKind) -> bool {
    matches!(
        (opener, closer),
        (PromTokenKind::LParen, PromTokenKind::RParen)
            | (PromTokenKind::LBrace, PromTokenKind::RBrace)
            | (PromTokenKind::LBracket, PromTokenKind::RBracket)
    )
}

fn is_closer(kind: &PromTokenKind) -> bool {
    matches!(
        kind,
        PromTokenKind::RParen | PromTokenKind::RBrace | PromTokenKind::RBracket
    )
}

/// Index of the innermost bracket in `tokens` that is not closed.
/// Stray closers are ignored.
fn innermost_open_bracket(tokens: &[PromToken]) -> Option<usize> {
    let mut stack: Vec<usize> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if is_opener(&token.kind) {
            stack.push(i);
        } else if is_closer(&token.kind) {
            if let Some(&top) = stack.last() {
                if closes(&tokens[top].kind, &token.kind) {
                    stack.pop();
                }
            }
        }
    }
    stack.pop()
}

/// Given the index of a closer, find its opener scanning backwards
fn matching_opener(tokens: &[PromToken], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        let kind = &tokens[i].kind;
        if is_closer(kind) {
            depth += 1;
        } else if is_opener(kind) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return closes(kind, &tokens[close].kind).then_some(i);
            }
        }
    }
    None
}

/// Given the index of an opener, find its closer scanning forwards
fn matching_closer(tokens: &[PromToken], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if is_opener(&token.kind) {
            depth += 1;
        } else if is_closer(&token.kind) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split `tokens` at commas that are not nested in brackets
fn split_top_level_commas(tokens: &[PromToken]) -> Vec<&[PromToken]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            ref k if is_opener(k) => depth += 1,
            ref k if is_closer(k) => depth = depth.saturating_sub(1),
            PromTokenKind::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/* ========================= selectors ========================= */

fn match_op(kind: &PromTokenKind) -> Option<MatchOp> {
    match kind {
        PromTokenKind::Eq => Some(MatchOp::Equal),
        PromTokenKind::Neq => Some(MatchOp::NotEqual),
        PromTokenKind::RegexMatch => Some(MatchOp::RegexMatch),
        PromTokenKind::RegexNoMatch => Some(MatchOp::RegexNoMatch),
        _ => None,
    }
}

/// A complete `name op "value"` matcher
fn parse_matcher(item: &[PromToken]) -> Option<Label> {
    let [name, op, value] = item else {
        return None;
    };
    let name = name.ident()?;
    let op = match_op(&op.kind)?;
    match &value.kind {
        PromTokenKind::String {
            value,
            terminated: true,
            ..
        } => Some(Label::with_op(name, op, value.as_str())),
        _ => None,
    }
}

/// Tokens up to (not including) the `}` closing a selector body
fn selector_body(tokens: &[PromToken]) -> &[PromToken] {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if is_opener(&token.kind) {
            depth += 1;
        } else if is_closer(&token.kind) {
            if depth == 0 {
                return &tokens[..i];
            }
            depth -= 1;
        }
    }
    tokens
}

/// All complete matchers in a selector body
pub(crate) fn selector_labels(body: &[PromToken]) -> Vec<Label> {
    split_top_level_commas(body)
        .into_iter()
        .filter_map(parse_matcher)
        .collect()
}

/// Metric name written right before a `{`
fn metric_before(tokens: &[PromToken], brace: usize) -> Option<String> {
    let prev = tokens.get(brace.checked_sub(1)?)?;
    prev.ident()
        .filter(|name| !is_keyword(name))
        .map(str::to_owned)
}

fn classify_selector(
    before: &[PromToken],
    brace: usize,
    after: &[PromToken],
) -> Option<SuggestionRequest> {
    let metric_name = metric_before(before, brace);

    let before_items = split_top_level_commas(&before[brace + 1..]);
    let (current, earlier) = before_items.split_last()?;

    // The first piece after the cursor is the rest of the current item
    let after_items = split_top_level_commas(selector_body(after));
    let later = after_items.get(1..).unwrap_or(&[]);

    let mut other_labels: Vec<Label> = earlier
        .iter()
        .chain(later.iter())
        .filter_map(|item| parse_matcher(item))
        .collect();

    match *current {
        [] => Some(SuggestionRequest::LabelNamesForSelector {
            metric_name,
            other_labels,
        }),
        [name, op] if match_op(&op.kind).is_some() => {
            let label_name = name.ident()?.to_owned();
            other_labels.retain(|l| l.name != label_name);
            Some(SuggestionRequest::LabelValues {
                metric_name,
                label_name,
                other_labels,
            })
        }
        _ => None,
    }
}

/* ========================= ranges ========================= */

fn classify_range(inside: &[PromToken]) -> Option<SuggestionRequest> {
    match inside.last() {
        None => Some(SuggestionRequest::AllDurations),
        Some(t) if matches!(t.kind, PromTokenKind::Colon) => Some(SuggestionRequest::AllDurations),
        _ => None,
    }
}

/* ========================= parens ========================= */

fn classify_paren(
    before: &[PromToken],
    paren: usize,
    after: &[PromToken],
) -> Option<SuggestionRequest> {
    let prev = paren.checked_sub(1).map(|i| &before[i]);

    match prev.and_then(PromToken::ident) {
        Some("by" | "without") => return classify_by(before, paren, after),
        Some("on" | "ignoring" | "group_left" | "group_right") => return None,
        _ => {}
    }

    let slot = if is_aggregation_call(before, paren) {
        Slot::Aggregation
    } else {
        Slot::Other
    };

    classify_expression(&before[paren + 1..], slot)
}

/// Whether the `(` at `paren` opens the argument list of an aggregation,
/// either `sum(` or `sum by (x) (`
fn is_aggregation_call(tokens: &[PromToken], paren: usize) -> bool {
    let Some(prev) = paren.checked_sub(1).map(|i| &tokens[i]) else {
        return false;
    };

    if let Some(name) = prev.ident() {
        return is_aggregation(name);
    }

    if matches!(prev.kind, PromTokenKind::RParen) {
        let Some(open) = matching_opener(tokens, paren - 1) else {
            return false;
        };
        let grouping = open.checked_sub(1).map(|i| &tokens[i]);
        let aggregation = open.checked_sub(2).map(|i| &tokens[i]);
        return grouping.is_some_and(|t| t.is_ident("by") || t.is_ident("without"))
            && aggregation
                .and_then(PromToken::ident)
                .is_some_and(is_aggregation);
    }

    false
}

fn classify_by(
    before: &[PromToken],
    paren: usize,
    after: &[PromToken],
) -> Option<SuggestionRequest> {
    // Only a name slot: right after `(` or after a comma
    let items = split_top_level_commas(&before[paren + 1..]);
    if !items.last().is_some_and(|item| item.is_empty()) {
        return None;
    }

    let keyword = paren - 1;
    let arguments = match keyword.checked_sub(1).map(|i| &before[i]) {
        // sum(x) by (
        Some(t) if matches!(t.kind, PromTokenKind::RParen) => {
            let close = keyword - 1;
            let open = matching_opener(before, close)?;
            &before[open + 1..close]
        }
        // sum by ( ... ) (x)
        _ => aggregation_arguments_after(after),
    };

    let (metric_name, other_labels) = find_vector_selector(arguments);

    Some(SuggestionRequest::LabelNamesForBy {
        metric_name,
        other_labels,
    })
}

/// For `sum by (<cursor> ...) (args)`, the tokens of `args`
fn aggregation_arguments_after(after: &[PromToken]) -> &[PromToken] {
    // Close of the by-list: the first unmatched `)`
    let mut depth = 0usize;
    let mut close = None;
    for (i, token) in after.iter().enumerate() {
        if is_opener(&token.kind) {
            depth += 1;
        } else if is_closer(&token.kind) {
            if depth == 0 {
                close = Some(i);
                break;
            }
            depth -= 1;
        }
    }

    let Some(open) = close.map(|c| c + 1) else {
        return &[];
    };
    if !after
        .get(open)
        .is_some_and(|t| matches!(t.kind, PromTokenKind::LParen))
    {
        return &[];
    }

    match matching_closer(after, open) {
        Some(end) => &after[open + 1..end],
        None => &after[open + 1..],
    }
}

/// The first vector selector in an expression: its metric name and its
/// complete label matchers
fn find_vector_selector(tokens: &[PromToken]) -> (Option<String>, Vec<Label>) {
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match &token.kind {
            PromTokenKind::Ident(name) => {
                let next = tokens.get(i + 1);
                let is_call = next.is_some_and(|t| matches!(t.kind, PromTokenKind::LParen));
                if !is_call && !is_keyword(name) {
                    let labels = match next {
                        Some(t) if matches!(t.kind, PromTokenKind::LBrace) => {
                            selector_labels(selector_body(&tokens[i + 2..]))
                        }
                        _ => Vec::new(),
                    };
                    return (Some(name.clone()), labels);
                }
                i += 1;
            }
            PromTokenKind::LBrace => {
                return (None, selector_labels(selector_body(&tokens[i + 1..])));
            }
            // Ranges and the grouping list of a nested aggregation hold no metric
            PromTokenKind::LBracket => {
                i = matching_closer(tokens, i).map_or(tokens.len(), |c| c + 1);
            }
            PromTokenKind::LParen
                if i > 0
                    && matches!(
                        tokens[i - 1].ident(),
                        Some("by" | "without" | "on" | "ignoring" | "group_left" | "group_right")
                    ) =>
            {
                i = matching_closer(tokens, i).map_or(tokens.len(), |c| c + 1);
            }
            _ => i += 1,
        }
    }
    (None, Vec::new())
}

/* ========================= expressions ========================= */

fn is_operator_keyword(token: &PromToken) -> bool {
    matches!(
        token.ident(),
        Some("and" | "or" | "unless" | "atan2" | "bool" | "group_left" | "group_right")
    )
}

fn classify_expression(group: &[PromToken], slot: Slot) -> Option<SuggestionRequest> {
    let items = split_top_level_commas(group);
    let tail = items.last().copied().unwrap_or(&[]);

    let Some(last) = tail.last() else {
        return Some(match slot {
            Slot::TopLevel => SuggestionRequest::AllMetricAndFunctionNamesAndHistory,
            Slot::Aggregation => SuggestionRequest::AllMetricNames,
            Slot::Other => SuggestionRequest::AllMetricAndFunctionNames,
        });
    };

    if last.kind.is_binary_operator() || is_operator_keyword(last) {
        return Some(SuggestionRequest::AllMetricAndFunctionNames);
    }

    if last.is_ident("offset") {
        return Some(SuggestionRequest::AllDurations);
    }

    // `a / on(x) ` or `a + ignoring(x) group_left(y) `
    if matches!(last.kind, PromTokenKind::RParen) {
        let close = tail.len() - 1;
        let modifier = matching_opener(tail, close)
            .and_then(|open| open.checked_sub(1))
            .and_then(|i| tail[i].ident());
        if matches!(
            modifier,
            Some("on" | "ignoring" | "group_left" | "group_right")
        ) {
            return Some(SuggestionRequest::AllMetricAndFunctionNames);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Classify `input` at the position marked with `^`
    fn at_marker(input: &str) -> Option<SuggestionRequest> {
        let offset = input.find('^').expect("input must contain a ^ marker");
        let text = input.replacen('^', "", 1);
        classify(&text, offset)
    }

    fn selector(metric: &str, labels: &[(&str, &str)]) -> SuggestionRequest {
        SuggestionRequest::LabelNamesForSelector {
            metric_name: Some(metric.to_string()),
            other_labels: labels.iter().map(|(n, v)| Label::new(*n, *v)).collect(),
        }
    }

    fn values(metric: &str, label: &str, labels: &[(&str, &str)]) -> SuggestionRequest {
        SuggestionRequest::LabelValues {
            metric_name: Some(metric.to_string()),
            label_name: label.to_string(),
            other_labels: labels.iter().map(|(n, v)| Label::new(*n, *v)).collect(),
        }
    }

    fn by(metric: &str) -> SuggestionRequest {
        SuggestionRequest::LabelNamesForBy {
            metric_name: Some(metric.to_string()),
            other_labels: Vec::new(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            at_marker("^"),
            Some(SuggestionRequest::AllMetricAndFunctionNamesAndHistory)
        );
    }

    #[test]
    fn test_partial_word_at_start() {
        assert_eq!(
            at_marker("node_cp^"),
            Some(SuggestionRequest::AllMetricAndFunctionNamesAndHistory)
        );
    }

    #[test]
    fn test_after_binary_operator() {
        assert_eq!(
            at_marker("sum(one) / ^"),
            Some(SuggestionRequest::AllMetricAndFunctionNames)
        );
        assert_eq!(
            at_marker("a > bool ^"),
            Some(SuggestionRequest::AllMetricAndFunctionNames)
        );
        assert_eq!(
            at_marker("a and ^"),
            Some(SuggestionRequest::AllMetricAndFunctionNames)
        );
        assert_eq!(
            at_marker("a / on(job) ^"),
            Some(SuggestionRequest::AllMetricAndFunctionNames)
        );
    }

    #[test]
    fn test_aggregation_argument() {
        assert_eq!(at_marker("sum(^)"), Some(SuggestionRequest::AllMetricNames));
        assert_eq!(
            at_marker("sum(one) / sum(^)"),
            Some(SuggestionRequest::AllMetricNames)
        );
        assert_eq!(
            at_marker("sum by (job) (^)"),
            Some(SuggestionRequest::AllMetricNames)
        );
        assert_eq!(
            at_marker("topk(5, ^)"),
            Some(SuggestionRequest::AllMetricNames)
        );
    }

    #[test]
    fn test_function_argument() {
        assert_eq!(
            at_marker("rate(^)"),
            Some(SuggestionRequest::AllMetricAndFunctionNames)
        );
        assert_eq!(
            at_marker("(^"),
            Some(SuggestionRequest::AllMetricAndFunctionNames)
        );
    }

    #[test]
    fn test_durations() {
        assert_eq!(
            at_marker("something{}[^]"),
            Some(SuggestionRequest::AllDurations)
        );
        assert_eq!(at_marker("rate(x[5^"), Some(SuggestionRequest::AllDurations));
        assert_eq!(at_marker("x[5m:^]"), Some(SuggestionRequest::AllDurations));
        assert_eq!(at_marker("x offset ^"), Some(SuggestionRequest::AllDurations));
    }

    #[test]
    fn test_label_names_for_selector() {
        assert_eq!(at_marker("something{^}"), Some(selector("something", &[])));
        assert_eq!(
            at_marker(r#"something{one="val1",two="val2",^}"#),
            Some(selector("something", &[("one", "val1"), ("two", "val2")]))
        );
    }

    #[test]
    fn test_label_names_for_by() {
        assert_eq!(at_marker("sum(something) by (^)"), Some(by("something")));
        assert_eq!(at_marker("sum by (^) (something)"), Some(by("something")));
        assert_eq!(
            at_marker("sum(rate(something[5m])) without (^)"),
            Some(by("something"))
        );
    }

    #[test]
    fn test_by_carries_selector_labels() {
        assert_eq!(
            at_marker(r#"sum by (job, ^) (up{env="prod"})"#),
            Some(SuggestionRequest::LabelNamesForBy {
                metric_name: Some("up".to_string()),
                other_labels: vec![Label::new("env", "prod")],
            })
        );
    }

    #[test]
    fn test_label_values() {
        assert_eq!(
            at_marker("something{job=^}"),
            Some(values("something", "job", &[]))
        );
        assert_eq!(
            at_marker(r#"something{job=^,host="h1"}"#),
            Some(values("something", "job", &[("host", "h1")]))
        );
        assert_eq!(
            at_marker(
                r#"something{one="val1",two="val2",three=^,four="val4",five="val5"}"#
            ),
            Some(values(
                "something",
                "three",
                &[
                    ("one", "val1"),
                    ("two", "val2"),
                    ("four", "val4"),
                    ("five", "val5")
                ]
            ))
        );
    }

    #[test]
    fn test_label_values_inside_quotes() {
        assert_eq!(
            at_marker(r#"up{job="ap^"}"#),
            Some(values("up", "job", &[]))
        );
        assert_eq!(
            at_marker(r#"up{job="^"#),
            Some(values("up", "job", &[]))
        );
    }

    #[test]
    fn test_label_values_keep_operator_of_others() {
        assert_eq!(
            at_marker(r#"up{env=~"prod.*",job!=^}"#),
            Some(SuggestionRequest::LabelValues {
                metric_name: Some("up".to_string()),
                label_name: "job".to_string(),
                other_labels: vec![Label::with_op("env", MatchOp::RegexMatch, "prod.*")],
            })
        );
    }

    #[test]
    fn test_selector_without_metric() {
        assert_eq!(
            at_marker(r#"{job="api",^}"#),
            Some(SuggestionRequest::LabelNamesForSelector {
                metric_name: None,
                other_labels: vec![Label::new("job", "api")],
            })
        );
    }

    #[test]
    fn test_incomplete_matchers_are_not_other_labels() {
        assert_eq!(
            at_marker(r#"up{job="unterminated, ^"#),
            Some(values("up", "job", &[]))
        );
        assert_eq!(
            at_marker(r#"up{broken=,^}"#),
            Some(selector("up", &[]))
        );
    }

    #[test]
    fn test_unrecognised_positions() {
        assert_eq!(at_marker("up ^"), None);
        assert_eq!(at_marker("up{job ^}"), None);
        assert_eq!(at_marker("x[5m ^]"), None);
        assert_eq!(at_marker("a / on(^)"), None);
        assert_eq!(at_marker(r#"label_replace(x, "ds^"#), None);
        assert_eq!(at_marker("sum by (job ^)"), None);
    }

    #[test]
    fn test_offset_is_clamped() {
        assert_eq!(
            classify("sum(", 1000),
            Some(SuggestionRequest::AllMetricNames)
        );
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        let inputs = [
            "", ")", "}", "]", ")))(((", "{{{", "[[[", "sum by", "sum by (", "by (",
            "{=", "{=\"", "a{b=~", "x[", "x[:", "(((a", "\"", "é{ü=", "sum(x) by",
            "sum by () (", "on(", "a + ignoring(", "{,,,}", "1 +",
        ];
        for input in inputs {
            for offset in 0..=input.len() + 1 {
                let _ = classify(input, offset);
            }
        }
    }
}
