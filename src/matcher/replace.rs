use crate::enums::FindType;
use crate::types::GroupId;

use super::error::MatcherResult;
use super::result::SequenceMatchResult;
use super::sequence_matcher::SequenceMatcher;

/// One piece of a replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchReplacement<T> {
    Elements(Vec<T>),
    /// Elements captured by a group of the current match.
    Group(GroupId),
    NamedGroup(String),
}

impl<T: Clone> SequenceMatcher<'_, '_, T> {
    /// Copy of the whole element list with the first match in the region
    /// replaced by `replacement`.
    pub fn replace_first(&mut self, replacement: &[T]) -> MatcherResult<Vec<T>> {
        self.rewrite(Some(1), |_, out| {
            out.extend_from_slice(replacement);
            Ok(())
        })
    }

    pub fn replace_all(&mut self, replacement: &[T]) -> MatcherResult<Vec<T>> {
        self.rewrite(None, |_, out| {
            out.extend_from_slice(replacement);
            Ok(())
        })
    }

    pub fn replace_first_extended(
        &mut self,
        replacement: &[MatchReplacement<T>],
    ) -> MatcherResult<Vec<T>> {
        self.rewrite(Some(1), |matcher, out| expand(matcher, replacement, out))
    }

    pub fn replace_all_extended(
        &mut self,
        replacement: &[MatchReplacement<T>],
    ) -> MatcherResult<Vec<T>> {
        self.rewrite(None, |matcher, out| expand(matcher, replacement, out))
    }

    /// Walks non-overlapping matches from the region start, copying the
    /// elements between them and letting `emit` write each replacement.
    fn rewrite<F>(&mut self, limit: Option<usize>, mut emit: F) -> MatcherResult<Vec<T>>
    where
        F: FnMut(&Self, &mut Vec<T>) -> MatcherResult<()>,
    {
        let saved = self.options().find_type;
        self.set_find_type(FindType::FindNonOverlapping);
        self.clear();

        let elements = self.source();
        let mut out = Vec::with_capacity(elements.len());
        let mut copied = 0;
        let mut replaced = 0;
        let mut outcome = Ok(());

        while limit.is_none_or(|limit| replaced < limit) && self.find() {
            let (start, end) = match (self.start(), self.end()) {
                (Ok(start), Ok(end)) => (start, end),
                (Err(err), _) | (_, Err(err)) => {
                    outcome = Err(err);
                    break;
                }
            };
            out.extend_from_slice(&elements[copied..start]);
            if let Err(err) = emit(self, &mut out) {
                outcome = Err(err);
                break;
            }
            copied = end;
            replaced += 1;
        }
        out.extend_from_slice(&elements[copied..]);

        tracing::event!(
            tracing::Level::TRACE,
            operation = "replace",
            replaced = replaced as u64
        );

        self.set_find_type(saved);
        self.clear();
        outcome.map(|()| out)
    }
}

fn expand<T: Clone>(
    matcher: &SequenceMatcher<'_, '_, T>,
    replacement: &[MatchReplacement<T>],
    out: &mut Vec<T>,
) -> MatcherResult<()> {
    for part in replacement {
        let captured = match part {
            MatchReplacement::Elements(elements) => Some(elements.as_slice()),
            MatchReplacement::Group(group) => matcher.group_nodes(*group)?,
            MatchReplacement::NamedGroup(name) => matcher.group_named(name)?,
        };
        if let Some(captured) = captured {
            out.extend_from_slice(captured);
        }
    }
    Ok(())
}
