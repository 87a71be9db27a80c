use std::sync::Arc;

use seqex::matcher::{MatchError, SequenceMatchResult};
use seqex::node::{EqualsNode, LiteralNode, NegateNode, SharedNodePattern};
use seqex::{PatternExpr, SequencePattern};

const SENTENCE: [&str; 5] = ["the", "quick", "brown", "fox", "jumps"];

fn word(text: &str) -> SharedNodePattern<&'static str> {
    Arc::new(LiteralNode::new(text))
}

fn not_word(text: &str) -> PatternExpr<&'static str> {
    PatternExpr::node(NegateNode::new(word(text)))
}

fn eq(c: char) -> PatternExpr<char> {
    PatternExpr::node(EqualsNode(c))
}

#[test]
fn named_group_around_a_repeat_captures_the_whole_run() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::named_group("ADJ", PatternExpr::repeat(not_word("fox"), 1, Some(2), true)),
        PatternExpr::shared_node(word("fox")),
    ]))
    .expect("pattern should compile");
    let mut matcher = pattern.matcher(&SENTENCE);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((1, 4)));
    assert_eq!(
        matcher.group_named("ADJ").expect("ADJ is bound"),
        Some(&SENTENCE[1..3])
    );
    assert_eq!(matcher.group_id("ADJ").expect("ADJ is bound"), 1);
    assert!(!matcher.find());
}

#[test]
fn repeated_group_keeps_its_first_capture() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::repeat(PatternExpr::named_group("ADJ", not_word("fox")), 1, Some(2), true),
        PatternExpr::shared_node(word("fox")),
    ]))
    .expect("pattern should compile");
    let mut matcher = pattern.matcher(&SENTENCE);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((1, 4)));
    assert_eq!(
        matcher.group_span_named("ADJ").expect("ADJ is bound"),
        Some((1, 2))
    );
}

#[test]
fn unmatched_alternative_leaves_its_group_empty() {
    let pattern = SequencePattern::compile(PatternExpr::or(vec![
        PatternExpr::group(eq('a')),
        PatternExpr::group(eq('b')),
    ]))
    .expect("pattern should compile");
    let elements: Vec<char> = "b".chars().collect();
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    assert_eq!(matcher.group_count(), 2);
    assert_eq!(matcher.group_span(1).expect("group 1 exists"), None);
    assert_eq!(matcher.group_span(2).expect("group 2 exists"), Some((0, 1)));
    assert_eq!(matcher.group_nodes(2).expect("group 2 exists"), Some(&['b'][..]));
}

#[test]
fn alternative_values_bind_to_the_enclosing_group() {
    let pattern = SequencePattern::compile(PatternExpr::named_group(
        "digit",
        PatternExpr::or(vec![
            PatternExpr::value(eq('1'), 1u32),
            PatternExpr::value(eq('2'), 2u32),
        ]),
    ))
    .expect("pattern should compile");
    let elements: Vec<char> = "x2".chars().collect();
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    let value = matcher
        .group_value_named("digit")
        .expect("digit is bound")
        .expect("the alternative carries a value");
    assert_eq!(value.downcast_ref::<u32>(), Some(&2));
}

#[test]
fn top_level_value_binds_to_the_whole_match() {
    let pattern = SequencePattern::compile(PatternExpr::value(
        PatternExpr::seq(vec![eq('h'), eq('i')]),
        "greeting",
    ))
    .expect("pattern should compile");
    let elements: Vec<char> = "ohi".chars().collect();
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    let value = matcher
        .group_value(0)
        .expect("group 0 exists")
        .expect("the match carries a value");
    assert_eq!(value.downcast_ref::<&str>(), Some(&"greeting"));
}

#[test]
fn duplicate_names_resolve_to_the_lowest_group() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::named_group("x", eq('a')),
        PatternExpr::named_group("x", eq('b')),
    ]))
    .expect("pattern should compile");
    assert_eq!(pattern.group_id("x"), Some(1));
    assert_eq!(pattern.var_group_bindings().name(2), Some("x"));
}

#[test]
fn snapshot_survives_reset() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        eq('a'),
        PatternExpr::named_group("tail", PatternExpr::plus(eq('b'))),
    ]))
    .expect("pattern should compile");
    let elements: Vec<char> = "xabbz".chars().collect();
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    let snapshot = matcher.to_basic_result().expect("a match is current");
    matcher.reset();

    assert_eq!(snapshot.start().expect("snapshot has a start"), 1);
    assert_eq!(snapshot.end().expect("snapshot has an end"), 4);
    assert_eq!(
        snapshot.group_named("tail").expect("tail is bound"),
        Some(&['b', 'b'][..])
    );
    assert_eq!(snapshot.matched_nodes().expect("snapshot has a span"), &['a', 'b', 'b'][..]);

    let err = matcher.start().expect_err("reset forgets the match");
    match err {
        MatchError::NoMatch { .. } => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn group_accessors_report_errors() {
    let pattern =
        SequencePattern::compile(PatternExpr::group(eq('a'))).expect("pattern should compile");
    let elements: Vec<char> = "a".chars().collect();
    let mut matcher = pattern.matcher(&elements);

    let err = matcher
        .group_span(0)
        .expect_err("no search has run yet");
    match err {
        MatchError::NoMatch { .. } => {}
        other => panic!("unexpected error: {other:?}"),
    }
    let err = matcher.to_basic_result().expect_err("no search has run yet");
    match err {
        MatchError::NoMatch { operation } => assert_eq!(operation, "to_basic_result"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(matcher.find());
    let err = matcher.group_span(2).expect_err("group 2 does not exist");
    match err {
        MatchError::GroupOutOfRange {
            group: 2,
            group_count: 1,
        } => {}
        other => panic!("unexpected error: {other:?}"),
    }
    let err = matcher
        .group_named("missing")
        .expect_err("no group is named missing");
    match err {
        MatchError::UnknownGroupName { name } => assert_eq!(name, "missing"),
        other => panic!("unexpected error: {other:?}"),
    }
    let err = matcher
        .node_match_result(0)
        .expect_err("results were not recorded");
    match err {
        MatchError::ResultsNotRecorded => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn region_and_position_are_validated() {
    let pattern = SequencePattern::compile(eq('a')).expect("pattern should compile");
    let elements: Vec<char> = "aaa".chars().collect();
    let mut matcher = pattern.matcher(&elements);

    let err = matcher.set_region(2, 1).expect_err("start after end");
    match err {
        MatchError::InvalidRegion { start: 2, end: 1, len: 3 } => {}
        other => panic!("unexpected error: {other:?}"),
    }
    let err = matcher.set_region(0, 4).expect_err("end past the elements");
    match err {
        MatchError::InvalidRegion { .. } => {}
        other => panic!("unexpected error: {other:?}"),
    }

    matcher.set_region(1, 2).expect("region should be valid");
    let err = matcher.find_from(0).expect_err("position before the region");
    match err {
        MatchError::IndexOutOfBounds {
            index: 0,
            start: 1,
            end: 2,
        } => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!matcher.find_from(2).expect("region end is a valid position"));
}
