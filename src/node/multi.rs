use std::fmt;
use std::sync::Arc;

use super::error::{NodeError, NodeResult};
use super::pattern::SharedNodePattern;
use super::text::LiteralNode;

pub type SharedMultiNodePattern<T> = Arc<dyn MultiNodePattern<T>>;

/// Predicate over a run of consecutive elements.
///
/// `match_ends` returns the exclusive end offsets of every run starting at
/// `start` that the pattern accepts. The matcher drops ends outside
/// `min_nodes..=max_nodes`, removes duplicates, and explores the remaining
/// ends longest-first when `greedy` is set, shortest-first otherwise.
pub trait MultiNodePattern<T>: Send + Sync + fmt::Debug {
    fn match_ends(&self, nodes: &[T], start: usize) -> Vec<usize>;

    fn min_nodes(&self) -> usize {
        1
    }

    fn max_nodes(&self) -> Option<usize> {
        None
    }

    fn greedy(&self) -> bool {
        true
    }
}

/// Matches any member of a list of element sequences, such as a phrase
/// list over tokens.
pub struct NodeSequenceSet<T> {
    sequences: Vec<Vec<SharedNodePattern<T>>>,
    min_nodes: usize,
    max_nodes: Option<usize>,
    greedy: bool,
}

impl<T> NodeSequenceSet<T> {
    pub fn new(sequences: Vec<Vec<SharedNodePattern<T>>>) -> NodeResult<Self> {
        let sequences: Vec<_> = sequences.into_iter().filter(|s| !s.is_empty()).collect();
        if sequences.is_empty() {
            return Err(NodeError::EmptySequenceSet);
        }
        Ok(Self {
            sequences,
            min_nodes: 1,
            max_nodes: None,
            greedy: true,
        })
    }

    pub fn with_bounds(mut self, min_nodes: usize, max_nodes: Option<usize>) -> Self {
        self.min_nodes = min_nodes;
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl<T: AsRef<str>> NodeSequenceSet<T> {
    /// Builds a phrase set where every phrase is split on whitespace and each
    /// word is compared with [`LiteralNode`].
    pub fn from_phrases<I, S>(phrases: I, case_insensitive: bool) -> NodeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sequences = phrases
            .into_iter()
            .map(|phrase| {
                phrase
                    .as_ref()
                    .split_whitespace()
                    .map(|word| {
                        let node = if case_insensitive {
                            LiteralNode::case_insensitive(word)
                        } else {
                            LiteralNode::new(word)
                        };
                        Arc::new(node) as SharedNodePattern<T>
                    })
                    .collect()
            })
            .collect();
        Self::new(sequences)
    }
}

impl<T> fmt::Debug for NodeSequenceSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSequenceSet")
            .field("sequences", &self.sequences)
            .field("min_nodes", &self.min_nodes)
            .field("max_nodes", &self.max_nodes)
            .finish()
    }
}

impl<T> MultiNodePattern<T> for NodeSequenceSet<T> {
    fn match_ends(&self, nodes: &[T], start: usize) -> Vec<usize> {
        self.sequences
            .iter()
            .filter(|seq| {
                nodes.len().saturating_sub(start) >= seq.len()
                    && seq
                        .iter()
                        .zip(&nodes[start..])
                        .all(|(pattern, node)| pattern.matches(node))
            })
            .map(|seq| start + seq.len())
            .collect()
    }

    fn min_nodes(&self) -> usize {
        self.min_nodes
    }

    fn max_nodes(&self) -> Option<usize> {
        self.max_nodes
    }

    fn greedy(&self) -> bool {
        self.greedy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_phrase_ending_at_start() {
        let set = NodeSequenceSet::<&str>::from_phrases(["new", "new york", "new york city"], false)
            .expect("phrases should build");
        let tokens = ["in", "new", "york", "city"];

        let mut ends = set.match_ends(&tokens, 1);
        ends.sort_unstable();
        assert_eq!(ends, vec![2, 3, 4]);
        assert!(set.match_ends(&tokens, 0).is_empty());
        assert!(set.match_ends(&tokens, 4).is_empty());
    }

    #[test]
    fn rejects_empty_set() {
        let err = NodeSequenceSet::<&str>::from_phrases(["  "], true)
            .expect_err("blank phrases leave nothing to match");
        match err {
            NodeError::EmptySequenceSet => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
