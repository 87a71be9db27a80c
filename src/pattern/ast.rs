use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::node::{
    MultiNodePattern, NodePattern, SharedMultiNodePattern, SharedNodeEquality, SharedNodePattern,
    StructuralEquality,
};
use crate::types::{GroupId, Payload};

use super::bindings::VarGroupBindings;

/// Pattern expression tree consumed by [`SequencePattern::compile`].
///
/// Group ids are assigned at compile time, depth-first in pre-order, with
/// group 0 reserved for the whole match.
///
/// [`SequencePattern::compile`]: super::SequencePattern::compile
pub enum PatternExpr<T> {
    Node(SharedNodePattern<T>),
    MultiNode(SharedMultiNodePattern<T>),
    Sequence(Vec<PatternExpr<T>>),
    Or(Vec<PatternExpr<T>>),
    /// Every child must match the same span.
    And(Vec<PatternExpr<T>>),
    Repeat {
        inner: Box<PatternExpr<T>>,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    },
    Group {
        inner: Box<PatternExpr<T>>,
        capture: bool,
        name: Option<String>,
        id: Option<GroupId>,
    },
    BackRef {
        group: GroupId,
        equality: SharedNodeEquality<T>,
    },
    /// Records `payload` as the value of the group that closes right after `inner`.
    Value {
        inner: Box<PatternExpr<T>>,
        payload: Payload,
    },
    SeqStart,
    SeqEnd,
}

impl<T> PatternExpr<T> {
    pub fn node<P: NodePattern<T> + 'static>(pattern: P) -> Self {
        PatternExpr::Node(Arc::new(pattern))
    }

    pub fn shared_node(pattern: SharedNodePattern<T>) -> Self {
        PatternExpr::Node(pattern)
    }

    pub fn multi_node<P: MultiNodePattern<T> + 'static>(pattern: P) -> Self {
        PatternExpr::MultiNode(Arc::new(pattern))
    }

    pub fn seq(children: Vec<PatternExpr<T>>) -> Self {
        PatternExpr::Sequence(children)
    }

    pub fn or(children: Vec<PatternExpr<T>>) -> Self {
        PatternExpr::Or(children)
    }

    pub fn and(children: Vec<PatternExpr<T>>) -> Self {
        PatternExpr::And(children)
    }

    pub fn repeat(inner: PatternExpr<T>, min: usize, max: Option<usize>, greedy: bool) -> Self {
        PatternExpr::Repeat {
            inner: Box::new(inner),
            min,
            max,
            greedy,
        }
    }

    /// `inner?`
    pub fn optional(inner: PatternExpr<T>) -> Self {
        Self::repeat(inner, 0, Some(1), true)
    }

    /// `inner*`
    pub fn star(inner: PatternExpr<T>) -> Self {
        Self::repeat(inner, 0, None, true)
    }

    /// `inner+`
    pub fn plus(inner: PatternExpr<T>) -> Self {
        Self::repeat(inner, 1, None, true)
    }

    pub fn group(inner: PatternExpr<T>) -> Self {
        PatternExpr::Group {
            inner: Box::new(inner),
            capture: true,
            name: None,
            id: None,
        }
    }

    pub fn named_group<S: Into<String>>(name: S, inner: PatternExpr<T>) -> Self {
        PatternExpr::Group {
            inner: Box::new(inner),
            capture: true,
            name: Some(name.into()),
            id: None,
        }
    }

    pub fn non_capturing(inner: PatternExpr<T>) -> Self {
        PatternExpr::Group {
            inner: Box::new(inner),
            capture: false,
            name: None,
            id: None,
        }
    }

    pub fn back_ref_with(group: GroupId, equality: SharedNodeEquality<T>) -> Self {
        PatternExpr::BackRef { group, equality }
    }

    pub fn value<V: Any + Send + Sync>(inner: PatternExpr<T>, value: V) -> Self {
        PatternExpr::Value {
            inner: Box::new(inner),
            payload: Arc::new(value),
        }
    }

    pub fn seq_start() -> Self {
        PatternExpr::SeqStart
    }

    pub fn seq_end() -> Self {
        PatternExpr::SeqEnd
    }

    /// Numbers capturing groups depth-first, pre-order, starting at `next`.
    /// Returns the next unused id.
    pub fn assign_group_ids(&mut self, next: GroupId) -> GroupId {
        match self {
            PatternExpr::Sequence(children) | PatternExpr::Or(children) | PatternExpr::And(children) => {
                children
                    .iter_mut()
                    .fold(next, |next, child| child.assign_group_ids(next))
            }
            PatternExpr::Repeat { inner, .. } | PatternExpr::Value { inner, .. } => {
                inner.assign_group_ids(next)
            }
            PatternExpr::Group {
                inner, capture, id, ..
            } => {
                let mut next = next;
                if *capture {
                    *id = Some(next);
                    next += 1;
                }
                inner.assign_group_ids(next)
            }
            PatternExpr::Node(_)
            | PatternExpr::MultiNode(_)
            | PatternExpr::BackRef { .. }
            | PatternExpr::SeqStart
            | PatternExpr::SeqEnd => next,
        }
    }

    /// Records the names of named groups. Ids must already be assigned.
    pub fn update_bindings(&self, bindings: &mut VarGroupBindings) {
        match self {
            PatternExpr::Sequence(children) | PatternExpr::Or(children) | PatternExpr::And(children) => {
                children.iter().for_each(|child| child.update_bindings(bindings));
            }
            PatternExpr::Repeat { inner, .. } | PatternExpr::Value { inner, .. } => {
                inner.update_bindings(bindings);
            }
            PatternExpr::Group {
                inner, name, id, ..
            } => {
                if let (Some(name), Some(id)) = (name, id) {
                    bindings.set(*id, name.clone());
                }
                inner.update_bindings(bindings);
            }
            PatternExpr::Node(_)
            | PatternExpr::MultiNode(_)
            | PatternExpr::BackRef { .. }
            | PatternExpr::SeqStart
            | PatternExpr::SeqEnd => {}
        }
    }

    /// Deep copy of the tree. Leaf predicates and payloads are shared.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    fn is_atomic(&self) -> bool {
        matches!(
            self,
            PatternExpr::Node(_)
                | PatternExpr::MultiNode(_)
                | PatternExpr::Or(_)
                | PatternExpr::And(_)
                | PatternExpr::Group { .. }
                | PatternExpr::BackRef { .. }
        )
    }
}

impl<T: PartialEq> PatternExpr<T> {
    /// Backreference comparing elements with `PartialEq`.
    pub fn back_ref(group: GroupId) -> Self {
        PatternExpr::BackRef {
            group,
            equality: Arc::new(StructuralEquality),
        }
    }
}

impl<T> Clone for PatternExpr<T> {
    fn clone(&self) -> Self {
        match self {
            PatternExpr::Node(p) => PatternExpr::Node(p.clone()),
            PatternExpr::MultiNode(p) => PatternExpr::MultiNode(p.clone()),
            PatternExpr::Sequence(c) => PatternExpr::Sequence(c.clone()),
            PatternExpr::Or(c) => PatternExpr::Or(c.clone()),
            PatternExpr::And(c) => PatternExpr::And(c.clone()),
            PatternExpr::Repeat {
                inner,
                min,
                max,
                greedy,
            } => PatternExpr::Repeat {
                inner: inner.clone(),
                min: *min,
                max: *max,
                greedy: *greedy,
            },
            PatternExpr::Group {
                inner,
                capture,
                name,
                id,
            } => PatternExpr::Group {
                inner: inner.clone(),
                capture: *capture,
                name: name.clone(),
                id: *id,
            },
            PatternExpr::BackRef { group, equality } => PatternExpr::BackRef {
                group: *group,
                equality: equality.clone(),
            },
            PatternExpr::Value { inner, payload } => PatternExpr::Value {
                inner: inner.clone(),
                payload: payload.clone(),
            },
            PatternExpr::SeqStart => PatternExpr::SeqStart,
            PatternExpr::SeqEnd => PatternExpr::SeqEnd,
        }
    }
}

fn write_children<T>(
    f: &mut fmt::Formatter<'_>,
    children: &[PatternExpr<T>],
    sep: &str,
) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    Ok(())
}

impl<T> fmt::Display for PatternExpr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternExpr::Node(p) => write!(f, "[{p:?}]"),
            PatternExpr::MultiNode(p) => write!(f, "<{p:?}>"),
            PatternExpr::Sequence(children) if children.is_empty() => f.write_str("()"),
            PatternExpr::Sequence(children) => write_children(f, children, " "),
            PatternExpr::Or(children) => {
                f.write_str("(")?;
                write_children(f, children, " | ")?;
                f.write_str(")")
            }
            PatternExpr::And(children) => {
                f.write_str("(")?;
                write_children(f, children, " & ")?;
                f.write_str(")")
            }
            PatternExpr::Repeat {
                inner,
                min,
                max,
                greedy,
            } => {
                if inner.is_atomic() {
                    write!(f, "{inner}")?;
                } else {
                    write!(f, "(?:{inner})")?;
                }
                match (*min, *max) {
                    (0, Some(1)) => f.write_str("?")?,
                    (0, None) => f.write_str("*")?,
                    (1, None) => f.write_str("+")?,
                    (min, None) => write!(f, "{{{min},}}")?,
                    (min, Some(max)) if min == max => write!(f, "{{{min}}}")?,
                    (min, Some(max)) => write!(f, "{{{min},{max}}}")?,
                }
                if !*greedy {
                    f.write_str("?")?;
                }
                Ok(())
            }
            PatternExpr::Group {
                inner,
                capture: true,
                name: Some(name),
                ..
            } => write!(f, "(?${name} {inner})"),
            PatternExpr::Group {
                inner,
                capture: true,
                ..
            } => write!(f, "({inner})"),
            PatternExpr::Group { inner, .. } => write!(f, "(?:{inner})"),
            PatternExpr::BackRef { group, .. } => write!(f, "\\{group}"),
            PatternExpr::Value { inner, .. } => write!(f, "{inner} => <value>"),
            PatternExpr::SeqStart => f.write_str("^"),
            PatternExpr::SeqEnd => f.write_str("$"),
        }
    }
}

impl<T> fmt::Debug for PatternExpr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatternExpr({self})")
    }
}
