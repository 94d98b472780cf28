//! End-to-end completion against a snapshot index: text + cursor in,
//! completion items out.

use std::sync::{Arc, RwLock};

use promsh::completion::{
    CompletionEngine, CompletionKind, DEFAULT_HISTORY_LIMIT, Label, MatchOp, SuggestionRequest,
    classify, resolve,
};
use promsh::error::PromshError;
use promsh::history::{PastQuery, QueryHistory};
use promsh::index::StaticIndex;
use tokio_test::{assert_err, assert_ok};

const SNAPSHOT: &str = r#"{
    "metadata": {
        "up": {"type": "gauge", "help": "Target is up", "unit": ""},
        "node_cpu_seconds_total": {"type": "counter", "help": "CPU time", "unit": "seconds"}
    },
    "series": [
        {"__name__": "up", "job": "api", "instance": "a:9090"},
        {"__name__": "up", "job": "db", "instance": "b:9090"},
        {"__name__": "node_cpu_seconds_total", "cpu": "0", "mode": "idle"}
    ]
}"#;

fn index() -> StaticIndex {
    assert_ok!(StaticIndex::from_json(SNAPSHOT))
}

/// Classify the text with `^` marking the cursor
fn at_cursor(marked: &str) -> Option<SuggestionRequest> {
    let offset = marked.find('^').expect("cursor marker");
    let text = marked.replacen('^', "", 1);
    classify(&text, offset)
}

async fn complete_marked(marked: &str, history: &[PastQuery]) -> Vec<(String, bool)> {
    let request = at_cursor(marked).expect("suggestion request");
    let items = assert_ok!(resolve(&request, &index(), history).await);
    items
        .into_iter()
        .map(|i| (i.insert_text, i.retrigger_on_insert))
        .collect()
}

#[test]
fn classify_known_positions() {
    assert_eq!(
        at_cursor("^"),
        Some(SuggestionRequest::AllMetricAndFunctionNamesAndHistory)
    );
    assert_eq!(
        at_cursor("sum(one) / ^"),
        Some(SuggestionRequest::AllMetricAndFunctionNames)
    );
    assert_eq!(at_cursor("sum(^)"), Some(SuggestionRequest::AllMetricNames));
    assert_eq!(
        at_cursor("something{^}"),
        Some(SuggestionRequest::LabelNamesForSelector {
            metric_name: Some("something".to_string()),
            other_labels: vec![],
        })
    );
    assert_eq!(
        at_cursor(r#"metric{a="1",b=^"#),
        Some(SuggestionRequest::LabelValues {
            metric_name: Some("metric".to_string()),
            label_name: "b".to_string(),
            other_labels: vec![Label::new("a", "1")],
        })
    );
}

#[test]
fn middle_label_is_excluded_from_other_labels() {
    let request = at_cursor(r#"m{a="1",b="2",c="^3",d="4",e="5"}"#);
    assert_eq!(
        request,
        Some(SuggestionRequest::LabelValues {
            metric_name: Some("m".to_string()),
            label_name: "c".to_string(),
            other_labels: vec![
                Label::new("a", "1"),
                Label::new("b", "2"),
                Label::new("d", "4"),
                Label::new("e", "5"),
            ],
        })
    );
}

#[tokio::test]
async fn selector_label_names_skip_used_labels() {
    let items = complete_marked(r#"up{job="api",^}"#, &[]).await;
    assert_eq!(items, vec![("instance=".to_string(), true)]);
}

#[tokio::test]
async fn by_clause_reads_labels_of_the_aggregated_metric() {
    let items = complete_marked(r#"sum by (^) (up{job="api"})"#, &[]).await;
    assert_eq!(items, vec![("instance".to_string(), false)]);

    let items = complete_marked("sum(node_cpu_seconds_total) by (^)", &[]).await;
    assert_eq!(
        items,
        vec![("cpu".to_string(), false), ("mode".to_string(), false)]
    );
}

#[tokio::test]
async fn label_values_are_quoted_and_filtered_by_other_labels() {
    let items = complete_marked(r#"up{job="api",instance=^}"#, &[]).await;
    assert_eq!(items, vec![("\"a:9090\"".to_string(), false)]);

    let items = complete_marked(r#"up{job!="api",instance=^}"#, &[]).await;
    assert_eq!(items, vec![("\"b:9090\"".to_string(), false)]);
}

#[tokio::test]
async fn bare_selector_uses_global_label_values() {
    let items = complete_marked("{job=^}", &[]).await;
    assert_eq!(
        items,
        vec![("\"api\"".to_string(), false), ("\"db\"".to_string(), false)]
    );
}

#[tokio::test]
async fn escaped_quotes_survive_into_the_series_lookup() {
    let index = assert_ok!(StaticIndex::from_json(
        r#"{"series": [
            {"__name__": "up", "path": "a\"b", "instance": "c:9090"},
            {"__name__": "up", "path": "ab", "instance": "d:9090"}
        ]}"#
    ));

    let request = at_cursor(r#"up{path="a\"b",^}"#).expect("suggestion request");
    assert_eq!(
        request,
        SuggestionRequest::LabelNamesForSelector {
            metric_name: Some("up".to_string()),
            other_labels: vec![Label::new("path", "a\"b")],
        }
    );
    let items = assert_ok!(resolve(&request, &index, &[]).await);
    let names: Vec<_> = items.iter().map(|i| i.insert_text.as_str()).collect();
    assert_eq!(names, vec!["instance="]);

    let request = at_cursor(r#"up{path="a\"b",instance=^}"#).expect("suggestion request");
    let items = assert_ok!(resolve(&request, &index, &[]).await);
    let values: Vec<_> = items.iter().map(|i| i.insert_text.as_str()).collect();
    assert_eq!(values, vec!["\"c:9090\""]);
}

#[tokio::test]
async fn history_is_bounded_distinct_and_recent_first() {
    let mut history = QueryHistory::new(100);
    for i in 0..12 {
        assert_ok!(history.record(&format!("up == {i}")));
    }
    assert_ok!(history.record("up == 11"));

    let request = SuggestionRequest::AllMetricAndFunctionNamesAndHistory;
    let items = assert_ok!(resolve(&request, &index(), &history.entries()).await);
    let past: Vec<_> = items
        .iter()
        .filter(|i| i.kind == CompletionKind::History)
        .map(|i| i.label.as_str())
        .collect();

    assert_eq!(past.len(), DEFAULT_HISTORY_LIMIT);
    assert_eq!(past[0], "up == 11");
    assert_eq!(past[1], "up == 10");
    assert_eq!(past[9], "up == 2");
}

#[tokio::test]
async fn missing_metadata_gives_empty_list() {
    let index = assert_ok!(StaticIndex::from_json(r#"{"series": []}"#));
    let items = assert_ok!(resolve(&SuggestionRequest::AllMetricNames, &index, &[]).await);
    assert!(items.is_empty());
}

#[tokio::test]
async fn index_errors_propagate() {
    let request = SuggestionRequest::LabelNamesForSelector {
        metric_name: Some("up".to_string()),
        other_labels: vec![Label::with_op("job", MatchOp::RegexMatch, "(")],
    };
    let err = assert_err!(resolve(&request, &index(), &[]).await);
    assert!(matches!(err, PromshError::Index(_)));
}

#[tokio::test]
async fn engine_replaces_the_word_under_the_cursor() {
    let history = Arc::new(RwLock::new(QueryHistory::new(10)));
    let engine = CompletionEngine::new(Arc::new(index()), history);

    let completions = assert_ok!(engine.complete("rate(node_c[5m])", 11).await);
    assert_eq!(completions.span, 5..11);
    let labels: Vec<_> = completions.items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["node_cpu_seconds_total"]);

    let completions = assert_ok!(engine.complete("x[", 2).await);
    assert_eq!(completions.request, Some(SuggestionRequest::AllDurations));
    assert_eq!(completions.items.len(), 4);
}
