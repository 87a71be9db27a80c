use std::mem;

use crate::pattern::StateId;

use super::branch::{Bid, BidIndex};
use super::transition::{Pending, Stepper, Thread};

/// The live frontier of a search attempt: every branch and the state it is
/// parked at, at one boundary between elements.
#[derive(Debug, Clone)]
pub(crate) struct MatchedStates {
    threads: Vec<Thread>,
    boundary: usize,
}

impl MatchedStates {
    pub(crate) fn new(bid: Bid, root: StateId, boundary: usize) -> Self {
        Self {
            threads: vec![Thread {
                bid,
                state: root,
                prev: None,
            }],
            boundary,
        }
    }

    pub(crate) fn boundary(&self) -> usize {
        self.boundary
    }

    pub(crate) fn len(&self) -> usize {
        self.threads.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub(crate) fn bids(&self) -> impl Iterator<Item = Bid> + '_ {
        self.threads.iter().map(|t| t.bid)
    }

    /// Consumes the element at the current boundary and moves past it.
    pub(crate) fn consume<T>(&mut self, stepper: &mut Stepper<'_, T>) {
        let mut out = Pending::default();
        for thread in mem::take(&mut self.threads) {
            stepper.consume(thread, self.boundary, &mut out);
        }
        self.threads = out.into_threads();
        self.boundary += 1;
    }

    /// Closes every branch over zero-width transitions at the current boundary.
    pub(crate) fn close<T>(&mut self, stepper: &mut Stepper<'_, T>) {
        let mut out = Pending::default();
        for thread in mem::take(&mut self.threads) {
            stepper.close(thread, self.boundary, &mut out);
        }
        self.threads = out.into_threads();
    }

    pub(crate) fn is_all_match(&self, match_state: StateId) -> bool {
        !self.threads.is_empty() && self.threads.iter().all(|t| t.state == match_state)
    }

    pub(crate) fn matched(&self, match_state: StateId) -> impl Iterator<Item = Bid> + '_ {
        self.threads
            .iter()
            .filter(move |t| t.state == match_state)
            .map(|t| t.bid)
    }

    /// Highest-priority branch that reached the match state.
    pub(crate) fn best_match(&self, match_state: StateId, index: &BidIndex) -> Option<Bid> {
        self.matched(match_state)
            .min_by(|a, b| index.compare(*a, *b))
    }

    pub(crate) fn drop_matches(&mut self, match_state: StateId) {
        self.threads.retain(|t| t.state != match_state);
    }

    /// Drops every branch ranked below the best accepted branch; none of
    /// them can win any more.
    pub(crate) fn prune_below_best_match(&mut self, match_state: StateId, index: &BidIndex) {
        let Some(best) = self.best_match(match_state, index) else {
            return;
        };
        self.threads
            .retain(|t| index.compare(t.bid, best) != std::cmp::Ordering::Greater);
    }

    /// When more than `limit` branches are live, keeps the best-ranked half
    /// (at most `limit`) and returns the rest as a deferred frontier.
    pub(crate) fn split(&mut self, limit: usize, index: &BidIndex) -> Option<MatchedStates> {
        let total = self.threads.len();
        if total <= limit {
            return None;
        }
        self.threads.sort_by(|a, b| index.compare(a.bid, b.bid));
        let keep = limit.min(total.div_ceil(2)).max(1);
        let overflow = self.threads.split_off(keep);
        Some(MatchedStates {
            threads: overflow,
            boundary: self.boundary,
        })
    }
}
