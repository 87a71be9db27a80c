use std::fmt;

use crate::pattern::VarGroupBindings;
use crate::types::{GroupId, Payload, Span};

use super::error::{MatchError, MatcherResult};

/// Span and bound value of one capture group.
#[derive(Debug, Clone)]
pub struct MatchedGroup {
    pub begin: usize,
    /// `None` while the group is still open.
    pub end: Option<usize>,
    pub value: Option<Payload>,
}

impl MatchedGroup {
    pub(crate) fn open(begin: usize) -> Self {
        Self {
            begin,
            end: None,
            value: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.end.map(|end| (self.begin, end))
    }
}

/// Captures of one accepted branch, copied out of the branch store.
#[derive(Debug, Clone)]
pub(crate) struct CapturedMatch {
    pub(crate) groups: Vec<Option<MatchedGroup>>,
    /// Node sub-results by offset from the region start, when recorded.
    pub(crate) results: Option<Vec<Option<Payload>>>,
}

impl CapturedMatch {
    pub(crate) fn span(&self) -> Option<Span> {
        self.groups.first()?.as_ref()?.span()
    }

    pub(crate) fn signature(&self) -> Vec<Option<Span>> {
        self.groups
            .iter()
            .map(|g| g.as_ref().and_then(MatchedGroup::span))
            .collect()
    }
}

/// Read access to a successful match.
///
/// Group accessors return `Ok(None)` for a group that exists in the pattern
/// but did not take part in the match.
pub trait SequenceMatchResult<T> {
    fn elements(&self) -> &[T];

    /// Number of capture groups, not counting group 0.
    fn group_count(&self) -> usize;

    fn var_group_bindings(&self) -> &VarGroupBindings;

    fn matched_group(&self, group: GroupId) -> MatcherResult<Option<&MatchedGroup>>;

    /// Sub-result the node pattern reported for the element at `index`.
    fn node_match_result(&self, index: usize) -> MatcherResult<Option<Payload>>;

    fn priority(&self) -> f64;

    fn score(&self) -> f64;

    fn start(&self) -> MatcherResult<usize> {
        self.start_of(0)?
            .ok_or(MatchError::NoMatch { operation: "start" })
    }

    fn end(&self) -> MatcherResult<usize> {
        self.end_of(0)?.ok_or(MatchError::NoMatch { operation: "end" })
    }

    fn start_of(&self, group: GroupId) -> MatcherResult<Option<usize>> {
        Ok(self.matched_group(group)?.map(|g| g.begin))
    }

    fn end_of(&self, group: GroupId) -> MatcherResult<Option<usize>> {
        Ok(self.matched_group(group)?.and_then(|g| g.end))
    }

    fn group_span(&self, group: GroupId) -> MatcherResult<Option<Span>> {
        Ok(self.matched_group(group)?.and_then(MatchedGroup::span))
    }

    /// Elements captured by `group`.
    fn group_nodes(&self, group: GroupId) -> MatcherResult<Option<&[T]>> {
        let span = self.group_span(group)?;
        let elements = self.elements();
        Ok(span.map(|(start, end)| &elements[start..end]))
    }

    /// Elements of the whole match.
    fn matched_nodes(&self) -> MatcherResult<&[T]> {
        let (start, end) = (self.start()?, self.end()?);
        Ok(&self.elements()[start..end])
    }

    fn group_value(&self, group: GroupId) -> MatcherResult<Option<Payload>> {
        Ok(self.matched_group(group)?.and_then(|g| g.value.clone()))
    }

    fn group_id(&self, name: &str) -> MatcherResult<GroupId> {
        self.var_group_bindings()
            .group_id(name)
            .ok_or_else(|| MatchError::UnknownGroupName {
                name: name.to_string(),
            })
    }

    fn group_named(&self, name: &str) -> MatcherResult<Option<&[T]>> {
        self.group_nodes(self.group_id(name)?)
    }

    fn group_span_named(&self, name: &str) -> MatcherResult<Option<Span>> {
        self.group_span(self.group_id(name)?)
    }

    fn group_value_named(&self, name: &str) -> MatcherResult<Option<Payload>> {
        self.group_value(self.group_id(name)?)
    }

    /// Sub-results of every element captured by `group`.
    fn group_match_results(&self, group: GroupId) -> MatcherResult<Option<Vec<Option<Payload>>>> {
        let Some((start, end)) = self.group_span(group)? else {
            return Ok(None);
        };
        (start..end)
            .map(|index| self.node_match_result(index))
            .collect::<MatcherResult<Vec<_>>>()
            .map(Some)
    }
}

pub(crate) fn check_group(group: GroupId, total_groups: usize) -> MatcherResult<()> {
    if group >= total_groups {
        return Err(MatchError::GroupOutOfRange {
            group,
            group_count: total_groups.saturating_sub(1),
        });
    }
    Ok(())
}

pub(crate) fn lookup_result(
    results: Option<&[Option<Payload>]>,
    region: Span,
    index: usize,
) -> MatcherResult<Option<Payload>> {
    let results = results.ok_or(MatchError::ResultsNotRecorded)?;
    if index < region.0 || index >= region.1 {
        return Err(MatchError::IndexOutOfBounds {
            index,
            start: region.0,
            end: region.1,
        });
    }
    Ok(results.get(index - region.0).cloned().flatten())
}

/// Detached copy of a match. Borrows only the element slice, so it stays
/// valid after the matcher that produced it is reset or reused.
pub struct BasicSequenceMatchResult<'e, T> {
    elements: &'e [T],
    groups: Vec<Option<MatchedGroup>>,
    bindings: VarGroupBindings,
    results: Option<Vec<Option<Payload>>>,
    region: Span,
    priority: f64,
    score: f64,
}

impl<'e, T> BasicSequenceMatchResult<'e, T> {
    pub(crate) fn new(
        elements: &'e [T],
        captured: CapturedMatch,
        bindings: VarGroupBindings,
        region: Span,
        priority: f64,
        score: f64,
    ) -> Self {
        Self {
            elements,
            groups: captured.groups,
            bindings,
            results: captured.results,
            region,
            priority,
            score,
        }
    }

    /// Region the match was searched in.
    pub fn region(&self) -> Span {
        self.region
    }
}

impl<T> SequenceMatchResult<T> for BasicSequenceMatchResult<'_, T> {
    fn elements(&self) -> &[T] {
        self.elements
    }

    fn group_count(&self) -> usize {
        self.groups.len().saturating_sub(1)
    }

    fn var_group_bindings(&self) -> &VarGroupBindings {
        &self.bindings
    }

    fn matched_group(&self, group: GroupId) -> MatcherResult<Option<&MatchedGroup>> {
        check_group(group, self.groups.len())?;
        Ok(self.groups[group].as_ref())
    }

    fn node_match_result(&self, index: usize) -> MatcherResult<Option<Payload>> {
        lookup_result(self.results.as_deref(), self.region, index)
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    fn score(&self) -> f64 {
        self.score
    }
}

impl<T> Clone for BasicSequenceMatchResult<'_, T> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements,
            groups: self.groups.clone(),
            bindings: self.bindings.clone(),
            results: self.results.clone(),
            region: self.region,
            priority: self.priority,
            score: self.score,
        }
    }
}

impl<T> fmt::Debug for BasicSequenceMatchResult<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicSequenceMatchResult")
            .field("groups", &self.groups)
            .field("bindings", &self.bindings)
            .field("region", &self.region)
            .field("priority", &self.priority)
            .field("score", &self.score)
            .finish()
    }
}
