use hashbrown::HashSet as FastHashSet;
use smallvec::SmallVec;

use crate::node::MultiNodePattern;
use crate::pattern::{SequencePattern, StateId, StateKind};
use crate::types::{Payload, Span};

use super::branch::{Bid, BranchStates, ConjKey, StateInfo};
use super::frontier::MatchedStates;
use super::result::{CapturedMatch, MatchedGroup};

/// Branch states are condensed once the store outgrows the live branches by
/// this margin.
const CONDENSE_SLACK: usize = 256;

/// One branch parked at a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Thread {
    pub(crate) bid: Bid,
    pub(crate) state: StateId,
    /// State the branch arrived from.
    pub(crate) prev: Option<StateId>,
}

/// Threads produced by one pass, deduplicated on `(bid, state)`.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    threads: Vec<Thread>,
    seen: FastHashSet<(Bid, StateId)>,
}

impl Pending {
    fn push(&mut self, thread: Thread) {
        if self.seen.insert((thread.bid, thread.state)) {
            self.threads.push(thread);
        }
    }

    pub(crate) fn into_threads(self) -> Vec<Thread> {
        self.threads
    }
}

/// States on the current zero-width path of a branch.
type Path = SmallVec<[StateId; 16]>;

/// Executes state transitions for one search attempt.
pub(crate) struct Stepper<'a, T> {
    pattern: &'a SequencePattern<T>,
    elements: &'a [T],
    region: Span,
    match_with_result: bool,
    pub(crate) branches: BranchStates,
}

impl<'a, T> Stepper<'a, T> {
    pub(crate) fn new(
        pattern: &'a SequencePattern<T>,
        elements: &'a [T],
        region: Span,
        match_with_result: bool,
    ) -> Self {
        Self {
            pattern,
            elements,
            region,
            match_with_result,
            branches: BranchStates::new(),
        }
    }

    /// Consuming pass: tries to consume the element at `position`.
    pub(crate) fn consume(&mut self, thread: Thread, position: usize, out: &mut Pending) {
        let pattern = self.pattern;
        let Thread { bid, state, .. } = thread;

        match &pattern.state(state).kind {
            StateKind::Match => out.push(thread),
            StateKind::Node(node) => {
                if position >= self.region.1 {
                    return;
                }
                let element = &self.elements[position];
                if self.match_with_result {
                    let Some(result) = node.match_with_result(element) else {
                        return;
                    };
                    if let Some(result) = result {
                        self.branches.add_result(bid, position, result);
                    }
                } else if !node.matches(element) {
                    return;
                }
                self.push_next(bid, state, out);
            }
            StateKind::MultiNode(node) => match self.branches.info(bid, state) {
                Some(StateInfo::RunEnd(end)) => {
                    if position + 1 >= end {
                        self.branches.clear_info(bid, state);
                        self.push_next(bid, state, out);
                    } else {
                        out.push(thread);
                    }
                }
                _ => {
                    if position >= self.region.1 {
                        return;
                    }
                    let ends = self.run_ends(&**node, position);
                    let total = ends.len();
                    for (i, end) in ends.into_iter().enumerate() {
                        let child = self.child(bid, i, total);
                        if end == position + 1 {
                            self.push_next(child, state, out);
                        } else {
                            self.branches.set_info(child, state, StateInfo::RunEnd(end));
                            out.push(Thread { bid: child, ..thread });
                        }
                    }
                }
            },
            StateKind::BackRef { group, equality } => {
                let Some((start, end)) = self
                    .branches
                    .group(bid, *group)
                    .and_then(MatchedGroup::span)
                else {
                    return;
                };
                if position >= self.region.1 {
                    return;
                }
                let consumed = match self.branches.info(bid, state) {
                    Some(StateInfo::Consumed(n)) => n,
                    _ => 0,
                };
                let Some(expected) = self.elements.get(start + consumed) else {
                    return;
                };
                if !equality.equal(&self.elements[position], expected) {
                    return;
                }
                if start + consumed + 1 >= end {
                    self.branches.clear_info(bid, state);
                    self.push_next(bid, state, out);
                } else {
                    self.branches
                        .set_info(bid, state, StateInfo::Consumed(consumed + 1));
                    out.push(thread);
                }
            }
            // zero-width states never wait for an element
            _ => {}
        }
    }

    /// Non-consuming pass at `boundary`: follows zero-width transitions until
    /// every branch waits at an element-consuming state or has matched.
    pub(crate) fn close(&mut self, thread: Thread, boundary: usize, out: &mut Pending) {
        let mut path = Path::new();
        self.close_state(thread.bid, thread.state, thread.prev, boundary, &mut path, out);
    }

    fn close_state(
        &mut self,
        bid: Bid,
        state: StateId,
        prev: Option<StateId>,
        boundary: usize,
        path: &mut Path,
        out: &mut Pending,
    ) {
        let pattern = self.pattern;
        let kind = &pattern.state(state).kind;
        // a zero-width cycle; RepeatEnd is bounded by its iteration start
        if path.contains(&state) && !matches!(kind, StateKind::RepeatEnd { .. }) {
            return;
        }
        let thread = Thread { bid, state, prev };

        match kind {
            StateKind::Match | StateKind::Node(_) | StateKind::MultiNode(_) => out.push(thread),
            StateKind::Split | StateKind::Value(_) => {
                self.close_next(bid, state, boundary, path, out);
            }
            StateKind::GroupStart(group) => {
                self.branches.start_group(bid, *group, boundary);
                self.close_next(bid, state, boundary, path, out);
            }
            StateKind::GroupEnd(group) => {
                let value = prev.and_then(|p| value_of(pattern, p));
                self.branches.end_group(bid, *group, boundary, value);
                self.close_next(bid, state, boundary, path, out);
            }
            StateKind::SeqStart => {
                if boundary == self.region.0 {
                    self.close_next(bid, state, boundary, path, out);
                }
            }
            StateKind::SeqEnd => {
                if boundary == self.region.1 {
                    self.close_next(bid, state, boundary, path, out);
                }
            }
            StateKind::Repeat { .. } => {
                self.repeat_options(bid, state, 0, boundary, path, out);
            }
            StateKind::RepeatEnd { repeat } => {
                let (count, iteration_start) = match self.branches.info(bid, *repeat) {
                    Some(StateInfo::Repeat {
                        count,
                        iteration_start,
                    }) => (count, Some(iteration_start)),
                    _ => (0, None),
                };
                path.push(state);
                if iteration_start == Some(boundary) {
                    // empty iteration: further ones would be empty too
                    self.branches.clear_info(bid, *repeat);
                    self.close_next(bid, *repeat, boundary, path, out);
                } else {
                    self.repeat_options(bid, *repeat, count + 1, boundary, path, out);
                }
                path.pop();
            }
            StateKind::BackRef { group, .. } => {
                if self.branches.info(bid, state).is_some() {
                    out.push(thread);
                    return;
                }
                match self
                    .branches
                    .group(bid, *group)
                    .and_then(MatchedGroup::span)
                {
                    Some((start, end)) if start == end => {
                        self.close_next(bid, state, boundary, path, out);
                    }
                    Some(_) => out.push(thread),
                    None => {}
                }
            }
            StateKind::ConjStart => {
                let key = ConjKey {
                    state,
                    bid,
                    start: boundary,
                };
                let children = pattern.state(state).next.len();
                self.branches.enter_conj(key, children);
                self.branches.set_info(bid, state, StateInfo::Conj(key));
                self.close_next(bid, state, boundary, path, out);
            }
            StateKind::ConjEnd { start, index } => {
                let Some(StateInfo::Conj(key)) = self.branches.info(bid, *start) else {
                    return;
                };
                let Some(partners) = self.branches.arrive_conj(key, *index, bid, boundary) else {
                    return;
                };
                for partner in &partners {
                    self.branches.merge(bid, *partner);
                }
                self.branches.clear_info(bid, *start);
                tracing::event!(
                    tracing::Level::TRACE,
                    operation = "conjunction",
                    start = key.start as u64,
                    end = boundary as u64,
                    merged = partners.len() as u64
                );
                self.close_next(bid, state, boundary, path, out);
            }
        }
    }

    /// Loop or leave the counted repeat at `repeat` after `count` iterations.
    fn repeat_options(
        &mut self,
        bid: Bid,
        repeat: StateId,
        count: usize,
        boundary: usize,
        path: &mut Path,
        out: &mut Pending,
    ) {
        let pattern = self.pattern;
        let StateKind::Repeat {
            body,
            min,
            max,
            greedy,
        } = &pattern.state(repeat).kind
        else {
            return;
        };
        let can_loop = max.is_none_or(|max| count < max);
        let can_exit = count >= *min;

        // true: run the body again
        let mut options: SmallVec<[bool; 2]> = SmallVec::new();
        let order = if *greedy { [true, false] } else { [false, true] };
        for looping in order {
            if (looping && can_loop) || (!looping && can_exit) {
                options.push(looping);
            }
        }

        let total = options.len();
        path.push(repeat);
        for (i, looping) in options.into_iter().enumerate() {
            let child = self.child(bid, i, total);
            if looping {
                self.branches.set_info(
                    child,
                    repeat,
                    StateInfo::Repeat {
                        count,
                        iteration_start: boundary,
                    },
                );
                self.close_state(child, *body, Some(repeat), boundary, path, out);
            } else {
                self.branches.clear_info(child, repeat);
                self.close_next(child, repeat, boundary, path, out);
            }
        }
        path.pop();
    }

    fn close_next(
        &mut self,
        bid: Bid,
        from: StateId,
        boundary: usize,
        path: &mut Path,
        out: &mut Pending,
    ) {
        let pattern = self.pattern;
        let next = &pattern.state(from).next;
        let total = next.len();
        path.push(from);
        for (i, &state) in next.iter().enumerate() {
            let child = self.child(bid, i, total);
            self.close_state(child, state, Some(from), boundary, path, out);
        }
        path.pop();
    }

    /// Parks the branch at every next state of `from`, to be closed in the
    /// following non-consuming pass.
    fn push_next(&mut self, bid: Bid, from: StateId, out: &mut Pending) {
        let pattern = self.pattern;
        let next = &pattern.state(from).next;
        let total = next.len();
        for (i, &state) in next.iter().enumerate() {
            let child = self.child(bid, i, total);
            out.push(Thread {
                bid: child,
                state,
                prev: Some(from),
            });
        }
    }

    fn child(&mut self, bid: Bid, index: usize, total: usize) -> Bid {
        if total > 1 {
            self.branches.fork(bid, index, total)
        } else {
            bid
        }
    }

    /// Run ends a multi-node pattern accepts at `start`, in exploration order.
    fn run_ends(&self, node: &dyn MultiNodePattern<T>, start: usize) -> Vec<usize> {
        let limit = self.region.1;
        let min = node.min_nodes().max(1);
        let max = node.max_nodes();
        let mut ends: Vec<usize> = node
            .match_ends(&self.elements[..limit], start)
            .into_iter()
            .filter(|&end| {
                end > start
                    && end <= limit
                    && end - start >= min
                    && max.is_none_or(|max| end - start <= max)
            })
            .collect();
        let reported = ends.len();
        ends.sort_unstable();
        ends.dedup();
        if ends.len() != reported {
            tracing::debug!(
                start = start as u64,
                duplicates = (reported - ends.len()) as u64,
                "multi-node pattern reported duplicate run ends"
            );
        }
        if node.greedy() {
            ends.reverse();
        }
        ends
    }

    /// Copies the captures of an accepted branch.
    pub(crate) fn capture(&self, bid: Bid) -> CapturedMatch {
        let groups = self
            .branches
            .captured_groups(bid, self.pattern.total_groups());
        let results = self.match_with_result.then(|| {
            let (start, end) = self.region;
            let mut slots: Vec<Option<Payload>> = vec![None; end - start];
            for (position, result) in self.branches.captured_results(bid) {
                if let Some(slot) = position
                    .checked_sub(start)
                    .and_then(|offset| slots.get_mut(offset))
                {
                    *slot = Some(result);
                }
            }
            slots
        });
        CapturedMatch { groups, results }
    }

    /// Drops branch states no live or deferred branch can reach.
    pub(crate) fn maybe_condense(&mut self, frontier: &MatchedStates, todo: &[MatchedStates]) {
        let live = frontier.len() + todo.iter().map(MatchedStates::len).sum::<usize>();
        if self.branches.len() <= CONDENSE_SLACK + 4 * live {
            return;
        }
        let keep: FastHashSet<Bid> = frontier
            .bids()
            .chain(todo.iter().flat_map(|deferred| deferred.bids()))
            .collect();
        self.branches.condense(&keep);
    }
}

fn value_of<T>(pattern: &SequencePattern<T>, state: StateId) -> Option<Payload> {
    match &pattern.state(state).kind {
        StateKind::Value(payload) => Some(payload.clone()),
        _ => None,
    }
}
