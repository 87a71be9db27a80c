use std::sync::Arc;

use seqex::matcher::{MatchError, MatcherOptions, SequenceMatchResult};
use seqex::node::{
    ConjunctionNode, DisjunctionNode, LiteralNode, NodeError, NodePattern, NodeSequenceSet,
    RegexNode, SharedNodePattern,
};
use seqex::{PatternExpr, SequencePattern};

const TOKENS: [&str; 7] = ["I", "moved", "to", "New", "York", "City", "today"];

#[test]
fn phrase_set_prefers_the_longest_phrase() {
    let places = NodeSequenceSet::from_phrases(["new york", "new york city"], true)
        .expect("phrases should build");
    let pattern =
        SequencePattern::compile(PatternExpr::named_group("place", PatternExpr::multi_node(places)))
            .expect("pattern should compile");
    let mut matcher = pattern.matcher(&TOKENS);

    assert!(matcher.find());
    assert_eq!(
        matcher.group_named("place").expect("place is bound"),
        Some(&TOKENS[3..6])
    );
}

#[test]
fn non_greedy_phrase_set_prefers_the_shortest_phrase() {
    let places = NodeSequenceSet::from_phrases(["new york", "new york city"], true)
        .expect("phrases should build")
        .with_greedy(false);
    let pattern = SequencePattern::compile(PatternExpr::multi_node(places))
        .expect("pattern should compile");
    let mut matcher = pattern.matcher(&TOKENS);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((3, 5)));
}

#[test]
fn phrase_set_backtracks_into_a_shorter_run() {
    let places = NodeSequenceSet::from_phrases(["new york", "new york city"], true)
        .expect("phrases should build");
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::multi_node(places),
        PatternExpr::node(LiteralNode::case_insensitive("city")),
        PatternExpr::node(LiteralNode::new("today")),
    ]))
    .expect("pattern should compile");
    let mut matcher = pattern.matcher(&TOKENS);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((3, 7)));
}

#[test]
fn phrase_set_bounds_filter_runs() {
    let places = NodeSequenceSet::from_phrases(["new york", "new york city"], true)
        .expect("phrases should build")
        .with_bounds(1, Some(2));
    let pattern = SequencePattern::compile(PatternExpr::multi_node(places))
        .expect("pattern should compile");
    let mut matcher = pattern.matcher(&TOKENS);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((3, 5)));
}

#[test]
fn case_sensitive_phrase_set_misses_other_casing() {
    let places = NodeSequenceSet::from_phrases(["new york"], false).expect("phrases should build");
    let pattern = SequencePattern::compile(PatternExpr::multi_node(places))
        .expect("pattern should compile");
    let mut matcher = pattern.matcher(&TOKENS);
    assert!(!matcher.find());
}

#[test]
fn empty_phrase_set_is_rejected() {
    let err = NodeSequenceSet::<&str>::from_phrases(["", "   "], true)
        .expect_err("no phrase has a word");
    match err {
        NodeError::EmptySequenceSet => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invalid_regex_is_reported() {
    let err = RegexNode::new("(unclosed").expect_err("regex should not compile");
    match err {
        NodeError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "(unclosed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn regex_sub_results_are_recorded_per_element() {
    let tokens = ["id", "item-42", "x"];
    let node = RegexNode::new("([a-z]+)-([0-9]+)").expect("regex should compile");
    let pattern = SequencePattern::compile(PatternExpr::group(PatternExpr::node(node)))
        .expect("pattern should compile");
    let options = MatcherOptions::builder()
        .match_with_result(true)
        .build()
        .expect("options should build");
    let mut matcher = pattern
        .matcher_with_options(&tokens, options)
        .expect("options are valid");

    assert!(matcher.find());
    assert_eq!(matcher.group_span(1).expect("group 1 exists"), Some((1, 2)));
    let results = matcher
        .group_match_results(1)
        .expect("results were recorded")
        .expect("group 1 took part");
    assert_eq!(results.len(), 1);
    let captures = results[0]
        .as_ref()
        .and_then(|result| result.downcast_ref::<Vec<Option<String>>>())
        .expect("regex reports its captures");
    assert_eq!(captures[1].as_deref(), Some("item"));
    assert_eq!(captures[2].as_deref(), Some("42"));

    assert!(matcher.node_match_result(0).expect("index is in the region").is_none());
    let err = matcher
        .node_match_result(3)
        .expect_err("index is past the region");
    match err {
        MatchError::IndexOutOfBounds { index: 3, .. } => {}
        other => panic!("unexpected error: {other:?}"),
    }

    let snapshot = matcher.to_basic_result().expect("a match is current");
    assert!(snapshot.node_match_result(1).expect("index is in the region").is_some());
}

#[test]
fn combinators_compose_element_predicates() {
    let starts_upper: SharedNodePattern<&str> = Arc::new(seqex::node::PredicateNode::new(
        "upper",
        |token: &&str| token.chars().next().is_some_and(char::is_uppercase),
    ));
    let york: SharedNodePattern<&str> = Arc::new(LiteralNode::new("York"));
    let city: SharedNodePattern<&str> = Arc::new(LiteralNode::new("City"));

    let both = ConjunctionNode::new(vec![starts_upper.clone(), york.clone()]);
    assert!(both.matches(&"York"));
    assert!(!both.matches(&"New"));

    let either = DisjunctionNode::new(vec![york, city]);
    assert!(either.matches(&"City"));
    assert!(!either.matches(&"today"));
    assert_eq!(format!("{either:?}"), r#"("York" | "City")"#);
}
