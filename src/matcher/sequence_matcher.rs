use std::collections::VecDeque;
use std::fmt;

use hashbrown::HashSet as FastHashSet;

use crate::enums::FindType;
use crate::pattern::{SequencePattern, VarGroupBindings};
use crate::types::{GroupId, Payload, Span};

use super::branch::Bid;
use super::error::{MatchError, MatcherResult};
use super::frontier::MatchedStates;
use super::options::MatcherOptions;
use super::result::{
    BasicSequenceMatchResult, CapturedMatch, MatchedGroup, SequenceMatchResult, check_group,
    lookup_result,
};
use super::transition::Stepper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    /// Highest-priority match starting at the attempt position.
    First,
    /// Every distinct match starting at the attempt position.
    All,
    /// Highest-priority match spanning the whole region.
    Full,
}

/// Searches one element sequence with a compiled [`SequencePattern`].
///
/// A matcher is stateful: it remembers the region, the position the next
/// `find` resumes from, and the current match. It is meant for a single
/// thread; share the pattern and create one matcher per search instead.
pub struct SequenceMatcher<'p, 'e, T> {
    pattern: &'p SequencePattern<T>,
    elements: &'e [T],
    options: MatcherOptions,
    region: Span,
    next_start: usize,
    current: Option<CapturedMatch>,
    /// Further matches found at the same start, in `FindAll` mode.
    pending: VecDeque<CapturedMatch>,
}

impl<'p, 'e, T> SequenceMatcher<'p, 'e, T> {
    pub(crate) fn new(
        pattern: &'p SequencePattern<T>,
        elements: &'e [T],
        options: MatcherOptions,
    ) -> Self {
        Self {
            pattern,
            elements,
            options,
            region: (0, elements.len()),
            next_start: 0,
            current: None,
            pending: VecDeque::new(),
        }
    }

    pub fn pattern(&self) -> &'p SequencePattern<T> {
        self.pattern
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    pub fn region(&self) -> Span {
        self.region
    }

    /// Restricts searching to `[start, end)`. Anchors match at the region
    /// bounds. Clears the current match.
    pub fn set_region(&mut self, start: usize, end: usize) -> MatcherResult<()> {
        if start > end || end > self.elements.len() {
            return Err(MatchError::InvalidRegion {
                start,
                end,
                len: self.elements.len(),
            });
        }
        self.region = (start, end);
        self.clear();
        Ok(())
    }

    /// Restores the full element range and forgets any match.
    pub fn reset(&mut self) {
        self.region = (0, self.elements.len());
        self.clear();
    }

    pub fn set_find_type(&mut self, find_type: FindType) {
        self.options.find_type = find_type;
        self.pending.clear();
    }

    pub fn set_branch_limit(&mut self, branch_limit: usize) -> MatcherResult<()> {
        let options = MatcherOptions {
            branch_limit,
            ..self.options
        };
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Takes effect on the next search.
    pub fn set_match_with_result(&mut self, match_with_result: bool) {
        self.options.match_with_result = match_with_result;
    }

    pub fn set_include_empty_matches(&mut self, include_empty_matches: bool) {
        self.options.include_empty_matches = include_empty_matches;
    }

    /// Whether the whole region matches the pattern.
    #[tracing::instrument(
        level = "trace",
        skip(self),
        fields(start = self.region.0 as u64, end = self.region.1 as u64)
    )]
    pub fn matches(&mut self) -> bool {
        self.pending.clear();
        let region = self.region;
        self.current = self
            .search(region.0, SearchMode::Full)
            .into_iter()
            .find(|found| found.span() == Some(region));
        self.current.is_some()
    }

    /// Advances to the next match in the region.
    ///
    /// With [`FindType::FindNonOverlapping`] the search resumes after the end
    /// of the previous match. With [`FindType::FindAll`] every distinct match
    /// at a start position is reported before moving one element on.
    #[tracing::instrument(
        level = "trace",
        skip(self),
        fields(from = self.next_start as u64, find_type = ?self.options.find_type)
    )]
    pub fn find(&mut self) -> bool {
        if let Some(next) = self.pending.pop_front() {
            self.current = Some(next);
            return true;
        }
        self.current = None;

        let (region_start, region_end) = self.region;
        let mode = match self.options.find_type {
            FindType::FindNonOverlapping => SearchMode::First,
            FindType::FindAll => SearchMode::All,
        };
        let mut start = self.next_start.max(region_start);

        while start < region_end || (start == region_end && self.options.include_empty_matches) {
            let mut found = self.search(start, mode).into_iter();
            let Some(first) = found.next() else {
                start += 1;
                continue;
            };
            let end = first.span().map_or(start, |(_, end)| end);
            self.next_start = match self.options.find_type {
                FindType::FindNonOverlapping if end > start => end,
                FindType::FindNonOverlapping => end + 1,
                FindType::FindAll => {
                    self.pending.extend(found);
                    start + 1
                }
            };
            tracing::event!(
                tracing::Level::TRACE,
                operation = "find",
                start = start as u64,
                end = end as u64,
                pending = self.pending.len() as u64
            );
            self.current = Some(first);
            return true;
        }

        self.next_start = region_end + 1;
        false
    }

    /// Resets the match state and finds the next match at or after `start`.
    pub fn find_from(&mut self, start: usize) -> MatcherResult<bool> {
        let (region_start, region_end) = self.region;
        if start < region_start || start > region_end {
            return Err(MatchError::IndexOutOfBounds {
                index: start,
                start: region_start,
                end: region_end,
            });
        }
        self.clear();
        self.next_start = start;
        Ok(self.find())
    }

    /// Iterates over non-overlapping matches from the region start. The
    /// previous find type is restored when the iterator is dropped.
    pub fn find_all_non_overlapping(&mut self) -> FindIter<'_, 'p, 'e, T> {
        let saved = self.options.find_type;
        self.options.find_type = FindType::FindNonOverlapping;
        self.clear();
        FindIter {
            matcher: self,
            saved,
        }
    }

    /// Detached copy of the current match.
    pub fn to_basic_result(&self) -> MatcherResult<BasicSequenceMatchResult<'e, T>> {
        let current = self.current.as_ref().ok_or(MatchError::NoMatch {
            operation: "to_basic_result",
        })?;
        Ok(BasicSequenceMatchResult::new(
            self.elements,
            current.clone(),
            self.pattern.var_group_bindings().clone(),
            self.region,
            self.pattern.priority(),
            self.pattern.weight(),
        ))
    }

    /// The searched elements, for the lifetime of the borrow.
    pub(crate) fn source(&self) -> &'e [T] {
        self.elements
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
        self.pending.clear();
        self.next_start = self.region.0;
    }

    fn current(&self, operation: &'static str) -> MatcherResult<&CapturedMatch> {
        self.current
            .as_ref()
            .ok_or(MatchError::NoMatch { operation })
    }

    /// One attempt at `start`. Accepted matches come back in priority order,
    /// without duplicate spans.
    fn search(&self, start: usize, mode: SearchMode) -> Vec<CapturedMatch> {
        let pattern = self.pattern;
        let match_state = pattern.match_state();
        let mut stepper = Stepper::new(
            pattern,
            self.elements,
            self.region,
            self.options.match_with_result,
        );
        let root = stepper.branches.root();
        let mut frontier = MatchedStates::new(root, pattern.root(), start);
        frontier.close(&mut stepper);

        let mut todo: Vec<MatchedStates> = Vec::new();
        // Captured on acceptance: later steps may condense the branch away.
        let mut accepted: Vec<(Bid, CapturedMatch)> = Vec::new();
        loop {
            self.run(&mut stepper, &mut frontier, &mut todo, start, mode);
            if mode == SearchMode::All {
                for bid in frontier.matched(match_state) {
                    if accepted.iter().all(|(seen, _)| *seen != bid) {
                        accepted.push((bid, stepper.capture(bid)));
                    }
                }
            } else if let Some(best) = frontier.best_match(match_state, stepper.branches.index()) {
                accepted.push((best, stepper.capture(best)));
                break;
            }
            match todo.pop() {
                Some(deferred) => frontier = deferred,
                None => break,
            }
        }

        accepted.sort_by(|(a, _), (b, _)| stepper.branches.compare(*a, *b));

        let mut seen = FastHashSet::new();
        accepted
            .into_iter()
            .map(|(_, found)| found)
            .filter(|found| found.span().is_some() && seen.insert(found.signature()))
            .collect()
    }

    /// Steps `frontier` until it dies, settles on matches, or runs out of
    /// elements. Overflow beyond the branch limit is pushed onto `todo`.
    fn run(
        &self,
        stepper: &mut Stepper<'_, T>,
        frontier: &mut MatchedStates,
        todo: &mut Vec<MatchedStates>,
        start: usize,
        mode: SearchMode,
    ) {
        let match_state = self.pattern.match_state();
        let region_end = self.region.1;

        loop {
            let boundary = frontier.boundary();
            let reject_matches = match mode {
                SearchMode::Full => boundary < region_end,
                _ => boundary == start && !self.options.include_empty_matches,
            };
            if reject_matches {
                frontier.drop_matches(match_state);
            }
            if mode != SearchMode::All {
                frontier.prune_below_best_match(match_state, stepper.branches.index());
            }
            if frontier.is_empty() || frontier.is_all_match(match_state) || boundary >= region_end {
                break;
            }

            let limit = self.options.branch_limit;
            if let Some(deferred) = frontier.split(limit, stepper.branches.index()) {
                tracing::event!(
                    tracing::Level::TRACE,
                    operation = "split",
                    boundary = boundary as u64,
                    kept = frontier.len() as u64,
                    deferred = deferred.len() as u64
                );
                todo.push(deferred);
            }

            frontier.consume(stepper);
            frontier.close(stepper);
            stepper.maybe_condense(frontier, todo);
        }
    }
}

impl<T> SequenceMatchResult<T> for SequenceMatcher<'_, '_, T> {
    fn elements(&self) -> &[T] {
        self.elements
    }

    fn group_count(&self) -> usize {
        self.pattern.total_groups().saturating_sub(1)
    }

    fn var_group_bindings(&self) -> &VarGroupBindings {
        self.pattern.var_group_bindings()
    }

    fn matched_group(&self, group: GroupId) -> MatcherResult<Option<&MatchedGroup>> {
        let current = self.current("matched_group")?;
        check_group(group, self.pattern.total_groups())?;
        Ok(current.groups.get(group).and_then(Option::as_ref))
    }

    fn node_match_result(&self, index: usize) -> MatcherResult<Option<Payload>> {
        let current = self.current("node_match_result")?;
        lookup_result(current.results.as_deref(), self.region, index)
    }

    fn priority(&self) -> f64 {
        self.pattern.priority()
    }

    fn score(&self) -> f64 {
        self.pattern.weight()
    }
}

impl<T> fmt::Debug for SequenceMatcher<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceMatcher")
            .field("pattern", &self.pattern)
            .field("options", &self.options)
            .field("region", &self.region)
            .field("next_start", &self.next_start)
            .field("current", &self.current.as_ref().and_then(CapturedMatch::span))
            .finish()
    }
}

/// Iterator returned by [`SequenceMatcher::find_all_non_overlapping`].
pub struct FindIter<'m, 'p, 'e, T> {
    matcher: &'m mut SequenceMatcher<'p, 'e, T>,
    saved: FindType,
}

impl<'e, T> Iterator for FindIter<'_, '_, 'e, T> {
    type Item = BasicSequenceMatchResult<'e, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.matcher.find() {
            return None;
        }
        self.matcher.to_basic_result().ok()
    }
}

impl<T> Drop for FindIter<'_, '_, '_, T> {
    fn drop(&mut self) {
        self.matcher.options.find_type = self.saved;
    }
}
