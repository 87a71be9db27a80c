use std::cmp::Ordering;
use std::sync::Arc;

use hashbrown::HashMap as FastHashMap;
use hashbrown::HashSet as FastHashSet;
use smallvec::SmallVec;

use crate::pattern::StateId;
use crate::types::{GroupId, Payload};

use super::result::MatchedGroup;

/// Branch id: one nondeterministic execution path of a search attempt.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct Bid(u32);

impl Bid {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct BidEntry {
    parent: Option<Bid>,
    child_index: u32,
    depth: u32,
}

/// Fork tree of branch ids. `(parent, child_index, total)` is memoized so
/// an identical fork shape yields the same id.
#[derive(Debug, Default)]
pub(crate) struct BidIndex {
    entries: Vec<BidEntry>,
    memo: FastHashMap<(Bid, u32, u32), Bid>,
}

impl BidIndex {
    pub(crate) fn root(&mut self) -> Bid {
        self.push(BidEntry {
            parent: None,
            child_index: 0,
            depth: 0,
        })
    }

    pub(crate) fn fork(&mut self, parent: Bid, child_index: usize, total: usize) -> Bid {
        let key = (parent, child_index as u32, total as u32);
        if let Some(&bid) = self.memo.get(&key) {
            return bid;
        }
        let depth = self.entries[parent.index()].depth + 1;
        let bid = self.push(BidEntry {
            parent: Some(parent),
            child_index: child_index as u32,
            depth,
        });
        self.memo.insert(key, bid);
        bid
    }

    fn push(&mut self, entry: BidEntry) -> Bid {
        let bid = Bid(self.entries.len() as u32);
        self.entries.push(entry);
        bid
    }

    fn entry(&self, bid: Bid) -> BidEntry {
        self.entries[bid.index()]
    }

    /// Orders branches by their fork path from the root: at the first fork
    /// where the paths differ, the lower child index comes first. An
    /// ancestor comes before its descendants.
    pub(crate) fn compare(&self, a: Bid, b: Bid) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let (mut x, mut y) = (a, b);
        while self.entry(x).depth > self.entry(y).depth {
            let Some(parent) = self.entry(x).parent else {
                break;
            };
            if parent == y {
                return Ordering::Greater;
            }
            x = parent;
        }
        while self.entry(y).depth > self.entry(x).depth {
            let Some(parent) = self.entry(y).parent else {
                break;
            };
            if parent == x {
                return Ordering::Less;
            }
            y = parent;
        }
        loop {
            let (ex, ey) = (self.entry(x), self.entry(y));
            match (ex.parent, ey.parent) {
                (Some(px), Some(py)) if px == py => {
                    return ex.child_index.cmp(&ey.child_index);
                }
                (Some(px), Some(py)) => {
                    x = px;
                    y = py;
                }
                _ => return x.0.cmp(&y.0),
            }
        }
    }
}

/// Per-branch bookkeeping a state keeps while the branch is inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StateInfo {
    /// Completed iterations of a counted loop and where the current one began.
    Repeat { count: usize, iteration_start: usize },
    /// Elements of the referenced group matched so far by a backreference.
    Consumed(usize),
    /// End of the run a multi-node state committed to.
    RunEnd(usize),
    /// Rendezvous record of the conjunction this branch is inside.
    Conj(ConjKey),
}

/// A conjunction entry: the state, the branch that entered it, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ConjKey {
    pub(crate) state: StateId,
    pub(crate) bid: Bid,
    pub(crate) start: usize,
}

/// Branches that finished each conjunct, with the boundary they finished at.
#[derive(Debug)]
struct ConjRecord {
    arrivals: Vec<SmallVec<[(Bid, usize); 2]>>,
}

/// Captures and state bookkeeping of one branch. Maps are shared with the
/// branch's ancestors until first written.
#[derive(Debug, Clone, Default)]
pub(crate) struct BranchState {
    groups: Arc<FastHashMap<GroupId, MatchedGroup>>,
    results: Arc<FastHashMap<usize, Payload>>,
    infos: Arc<FastHashMap<StateId, StateInfo>>,
}

/// All branch bookkeeping of one search attempt.
#[derive(Debug, Default)]
pub(crate) struct BranchStates {
    index: BidIndex,
    states: FastHashMap<Bid, BranchState>,
    conj: FastHashMap<ConjKey, ConjRecord>,
}

impl BranchStates {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn root(&mut self) -> Bid {
        self.index.root()
    }

    /// Child branch `child_index` of `total`; inherits the parent's state.
    pub(crate) fn fork(&mut self, parent: Bid, child_index: usize, total: usize) -> Bid {
        let child = self.index.fork(parent, child_index, total);
        match self.states.get(&parent).cloned() {
            Some(state) => {
                self.states.insert(child, state);
            }
            None => {
                self.states.remove(&child);
            }
        }
        child
    }

    pub(crate) fn index(&self) -> &BidIndex {
        &self.index
    }

    pub(crate) fn compare(&self, a: Bid, b: Bid) -> Ordering {
        self.index.compare(a, b)
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    fn state_mut(&mut self, bid: Bid) -> &mut BranchState {
        self.states.entry(bid).or_default()
    }

    pub(crate) fn group(&self, bid: Bid, group: GroupId) -> Option<&MatchedGroup> {
        self.states.get(&bid)?.groups.get(&group)
    }

    /// Opens `group` at `position`. A group that already closed keeps its
    /// first capture.
    pub(crate) fn start_group(&mut self, bid: Bid, group: GroupId, position: usize) {
        if let Some(existing) = self.group(bid, group)
            && existing.end.is_some()
        {
            tracing::debug!(
                group = group as u64,
                position = position as u64,
                begin = existing.begin as u64,
                "capture group re-entered after closing; keeping first capture"
            );
            return;
        }
        let state = self.state_mut(bid);
        Arc::make_mut(&mut state.groups).insert(group, MatchedGroup::open(position));
    }

    pub(crate) fn end_group(
        &mut self,
        bid: Bid,
        group: GroupId,
        position: usize,
        value: Option<Payload>,
    ) {
        match self.group(bid, group).map(|g| g.end.is_some()) {
            None => {
                tracing::warn!(
                    group = group as u64,
                    position = position as u64,
                    "closing a capture group that was never opened"
                );
            }
            Some(false) => {
                let state = self.state_mut(bid);
                if let Some(open) = Arc::make_mut(&mut state.groups).get_mut(&group) {
                    open.end = Some(position);
                    open.value = value;
                }
            }
            Some(true) => {}
        }
    }

    /// Records a node sub-result; the first write at a position wins.
    pub(crate) fn add_result(&mut self, bid: Bid, position: usize, result: Payload) {
        let state = self.state_mut(bid);
        if state.results.contains_key(&position) {
            tracing::warn!(
                position = position as u64,
                "node result already recorded at position; keeping first"
            );
            return;
        }
        Arc::make_mut(&mut state.results).insert(position, result);
    }

    pub(crate) fn info(&self, bid: Bid, state: StateId) -> Option<StateInfo> {
        self.states.get(&bid)?.infos.get(&state).copied()
    }

    pub(crate) fn set_info(&mut self, bid: Bid, state: StateId, info: StateInfo) {
        let branch = self.state_mut(bid);
        Arc::make_mut(&mut branch.infos).insert(state, info);
    }

    pub(crate) fn clear_info(&mut self, bid: Bid, state: StateId) {
        if let Some(branch) = self.states.get_mut(&bid)
            && branch.infos.contains_key(&state)
        {
            Arc::make_mut(&mut branch.infos).remove(&state);
        }
    }

    pub(crate) fn enter_conj(&mut self, key: ConjKey, children: usize) {
        self.conj.insert(
            key,
            ConjRecord {
                arrivals: vec![SmallVec::new(); children],
            },
        );
    }

    /// Records that conjunct `index` finished on `bid` at `boundary`. When
    /// every other conjunct has a branch finishing at the same boundary,
    /// returns those branches.
    pub(crate) fn arrive_conj(
        &mut self,
        key: ConjKey,
        index: usize,
        bid: Bid,
        boundary: usize,
    ) -> Option<SmallVec<[Bid; 4]>> {
        let record = self.conj.get_mut(&key)?;
        record.arrivals.get_mut(index)?.push((bid, boundary));

        let mut partners = SmallVec::new();
        for (other, arrivals) in record.arrivals.iter().enumerate() {
            if other == index {
                continue;
            }
            let (partner, _) = arrivals.iter().find(|(_, end)| *end == boundary)?;
            partners.push(*partner);
        }
        Some(partners)
    }

    /// Copies groups and node results of `from` that `into` lacks.
    pub(crate) fn merge(&mut self, into: Bid, from: Bid) {
        let Some(source) = self.states.get(&from).cloned() else {
            return;
        };
        let target = self.state_mut(into);
        if source.groups.keys().any(|g| !target.groups.contains_key(g)) {
            let groups = Arc::make_mut(&mut target.groups);
            for (g, mg) in source.groups.iter() {
                groups.entry(*g).or_insert_with(|| mg.clone());
            }
        }
        if source.results.keys().any(|p| !target.results.contains_key(p)) {
            let results = Arc::make_mut(&mut target.results);
            for (p, r) in source.results.iter() {
                results.entry(*p).or_insert_with(|| r.clone());
            }
        }
    }

    /// Closed groups of `bid`, indexed by group id.
    pub(crate) fn captured_groups(&self, bid: Bid, total_groups: usize) -> Vec<Option<MatchedGroup>> {
        let mut groups = vec![None; total_groups];
        if let Some(state) = self.states.get(&bid) {
            for (g, mg) in state.groups.iter() {
                if mg.end.is_some()
                    && let Some(slot) = groups.get_mut(*g)
                {
                    *slot = Some(mg.clone());
                }
            }
        }
        groups
    }

    pub(crate) fn captured_results(&self, bid: Bid) -> Vec<(usize, Payload)> {
        self.states
            .get(&bid)
            .map(|state| state.results.iter().map(|(p, r)| (*p, r.clone())).collect())
            .unwrap_or_default()
    }

    /// Drops the state of every branch not in `live` and not waiting at a
    /// conjunction rendezvous.
    pub(crate) fn condense(&mut self, live: &FastHashSet<Bid>) {
        let before = self.states.len();
        let waiting: FastHashSet<Bid> = self
            .conj
            .values()
            .flat_map(|record| record.arrivals.iter().flatten().map(|(bid, _)| *bid))
            .collect();
        self.states
            .retain(|bid, _| live.contains(bid) || waiting.contains(bid));
        tracing::event!(
            tracing::Level::TRACE,
            operation = "condense",
            before = before as u64,
            after = self.states.len() as u64
        );
    }
}
