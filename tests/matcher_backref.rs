use seqex::matcher::SequenceMatchResult;
use seqex::node::{AnyNode, EqualsNode, NodeEquality};
use seqex::{PatternExpr, SequencePattern};
use std::sync::Arc;

fn chars(text: &str) -> Vec<char> {
    text.chars().collect()
}

fn any() -> PatternExpr<char> {
    PatternExpr::node(AnyNode)
}

#[derive(Debug)]
struct IgnoreCase;

impl NodeEquality<char> for IgnoreCase {
    fn equal(&self, left: &char, right: &char) -> bool {
        left.eq_ignore_ascii_case(right)
    }
}

#[test]
fn backreference_repeats_the_captured_element() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::group(any()),
        PatternExpr::back_ref(1),
    ]))
    .expect("pattern should compile");

    let pair = chars("aa");
    let mut matcher = pattern.matcher(&pair);
    assert!(matcher.matches());

    let mixed = chars("ab");
    let mut matcher = pattern.matcher(&mixed);
    assert!(!matcher.matches());
    assert!(!matcher.find());
}

#[test]
fn chained_backreferences_consume_one_run() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::group(any()),
        PatternExpr::back_ref(1),
        PatternExpr::back_ref(1),
    ]))
    .expect("pattern should compile");
    let elements = chars("aaa");
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((0, 3)));
    assert!(!matcher.find());
}

#[test]
fn backreference_to_a_multi_element_group() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::group(PatternExpr::plus(PatternExpr::node(EqualsNode('a')))),
        PatternExpr::node(EqualsNode('-')),
        PatternExpr::back_ref(1),
    ]))
    .expect("pattern should compile");
    let elements = chars("aa-aaa");
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((0, 5)));
    assert_eq!(matcher.group_span(1).expect("group 1 exists"), Some((0, 2)));
}

#[test]
fn backreference_to_an_empty_group_is_zero_width() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::group(PatternExpr::star(PatternExpr::node(EqualsNode('x')))),
        PatternExpr::node(EqualsNode('b')),
        PatternExpr::back_ref(1),
    ]))
    .expect("pattern should compile");
    let elements = chars("bb");
    let mut matcher = pattern.matcher(&elements);

    assert!(matcher.find());
    assert_eq!(matcher.group_span(0).expect("group 0 exists"), Some((0, 1)));
    assert_eq!(matcher.group_span(1).expect("group 1 exists"), Some((0, 0)));
}

#[test]
fn backreference_uses_the_supplied_equality() {
    let pattern = SequencePattern::compile(PatternExpr::seq(vec![
        PatternExpr::group(any()),
        PatternExpr::<char>::back_ref_with(1, Arc::new(IgnoreCase)),
    ]))
    .expect("pattern should compile");
    let elements = chars("aA");
    let mut matcher = pattern.matcher(&elements);
    assert!(matcher.matches());
}
