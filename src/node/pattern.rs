use std::fmt;
use std::sync::Arc;

use crate::types::Payload;

/// Structured result a leaf predicate may attach to the element it matched.
pub type SubResult = Option<Payload>;

pub type SharedNodePattern<T> = Arc<dyn NodePattern<T>>;
pub type SharedNodeEquality<T> = Arc<dyn NodeEquality<T>>;

/// Predicate over a single element.
pub trait NodePattern<T>: Send + Sync + fmt::Debug {
    fn matches(&self, node: &T) -> bool;

    /// Like [`matches`](Self::matches), but lets the predicate report an
    /// internal result for the matched element. `None` means no match.
    fn match_with_result(&self, node: &T) -> Option<SubResult> {
        self.matches(node).then_some(None)
    }
}

/// Element equality used by backreferences.
pub trait NodeEquality<T>: Send + Sync + fmt::Debug {
    fn equal(&self, left: &T, right: &T) -> bool;
}

/// `PartialEq` on the elements themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralEquality;

impl<T: PartialEq> NodeEquality<T> for StructuralEquality {
    fn equal(&self, left: &T, right: &T) -> bool {
        left == right
    }
}

/// Matches every element.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyNode;

impl<T> NodePattern<T> for AnyNode {
    fn matches(&self, _node: &T) -> bool {
        true
    }
}

/// Matches elements equal to a fixed value.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualsNode<T>(pub T);

impl<T> NodePattern<T> for EqualsNode<T>
where
    T: PartialEq + fmt::Debug + Send + Sync,
{
    fn matches(&self, node: &T) -> bool {
        *node == self.0
    }
}

/// Adapts a closure into a node pattern. The label is what `Debug` prints.
pub struct PredicateNode<F> {
    label: String,
    predicate: F,
}

impl<F> PredicateNode<F> {
    pub fn new<S: Into<String>>(label: S, predicate: F) -> Self {
        Self {
            label: label.into(),
            predicate,
        }
    }
}

impl<F> fmt::Debug for PredicateNode<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<T, F> NodePattern<T> for PredicateNode<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, node: &T) -> bool {
        (self.predicate)(node)
    }
}

pub struct NegateNode<T> {
    inner: SharedNodePattern<T>,
}

impl<T> NegateNode<T> {
    pub fn new(inner: SharedNodePattern<T>) -> Self {
        Self { inner }
    }
}

impl<T> fmt::Debug for NegateNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{:?}", self.inner)
    }
}

impl<T> NodePattern<T> for NegateNode<T> {
    fn matches(&self, node: &T) -> bool {
        !self.inner.matches(node)
    }
}

/// All children must match. Children's sub-results are not propagated.
pub struct ConjunctionNode<T> {
    children: Vec<SharedNodePattern<T>>,
}

impl<T> ConjunctionNode<T> {
    pub fn new(children: Vec<SharedNodePattern<T>>) -> Self {
        Self { children }
    }
}

impl<T> fmt::Debug for ConjunctionNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.children, " & ")
    }
}

impl<T> NodePattern<T> for ConjunctionNode<T> {
    fn matches(&self, node: &T) -> bool {
        self.children.iter().all(|child| child.matches(node))
    }
}

/// At least one child must match. Children's sub-results are not propagated.
pub struct DisjunctionNode<T> {
    children: Vec<SharedNodePattern<T>>,
}

impl<T> DisjunctionNode<T> {
    pub fn new(children: Vec<SharedNodePattern<T>>) -> Self {
        Self { children }
    }
}

impl<T> fmt::Debug for DisjunctionNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.children, " | ")
    }
}

impl<T> NodePattern<T> for DisjunctionNode<T> {
    fn matches(&self, node: &T) -> bool {
        self.children.iter().any(|child| child.matches(node))
    }
}

fn write_joined<T>(
    f: &mut fmt::Formatter<'_>,
    children: &[SharedNodePattern<T>],
    sep: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child:?}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared<P: NodePattern<char> + 'static>(p: P) -> SharedNodePattern<char> {
        Arc::new(p)
    }

    #[test]
    fn combinators_follow_boolean_logic() {
        let vowel = shared(PredicateNode::new("vowel", |c: &char| "aeiou".contains(*c)));
        let a = shared(EqualsNode('a'));

        let not_vowel = NegateNode::new(vowel.clone());
        assert!(not_vowel.matches(&'x'));
        assert!(!not_vowel.matches(&'e'));

        let both = ConjunctionNode::new(vec![vowel.clone(), a.clone()]);
        assert!(both.matches(&'a'));
        assert!(!both.matches(&'e'));

        let either = DisjunctionNode::new(vec![shared(EqualsNode('x')), a]);
        assert!(either.matches(&'x'));
        assert!(!either.matches(&'e'));

        assert_eq!(format!("{both:?}"), "(vowel & EqualsNode('a'))");
    }

    #[test]
    fn default_result_carries_no_payload() {
        assert!(matches!(AnyNode.match_with_result(&1u8), Some(None)));
        assert!(EqualsNode(3u8).match_with_result(&4u8).is_none());
    }
}
