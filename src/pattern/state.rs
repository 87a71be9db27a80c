use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::node::{SharedMultiNodePattern, SharedNodeEquality, SharedNodePattern};
use crate::types::{GroupId, Payload};

/// Index of a state in the pattern's state arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StateFlags: u8 {
        /// Built inside a part of the pattern that may be skipped.
        const OPTIONAL = 1 << 0;
        /// Built inside one alternative of an `Or` or one child of an `And`.
        const BRANCHED = 1 << 1;
    }
}

pub type NextStates = SmallVec<[StateId; 2]>;

pub(crate) enum StateKind<T> {
    /// Accepting state; a branch parked here has matched.
    Match,
    /// Pure fan-out to the next states, in priority order.
    Split,
    Node(SharedNodePattern<T>),
    MultiNode(SharedMultiNodePattern<T>),
    /// Counted loop. `next` holds the exits; the body starts at `body`.
    Repeat {
        body: StateId,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    },
    /// End of one iteration of the `Repeat` at `repeat`.
    RepeatEnd { repeat: StateId },
    BackRef {
        group: GroupId,
        equality: SharedNodeEquality<T>,
    },
    GroupStart(GroupId),
    GroupEnd(GroupId),
    Value(Payload),
    /// Fans out to every conjunct; `next` holds the conjunct starts.
    ConjStart,
    ConjEnd { start: StateId, index: usize },
    SeqStart,
    SeqEnd,
}

impl<T> StateKind<T> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            StateKind::Match => "match",
            StateKind::Split => "split",
            StateKind::Node(_) => "node",
            StateKind::MultiNode(_) => "multi_node",
            StateKind::Repeat { .. } => "repeat",
            StateKind::RepeatEnd { .. } => "repeat_end",
            StateKind::BackRef { .. } => "back_ref",
            StateKind::GroupStart(_) => "group_start",
            StateKind::GroupEnd(_) => "group_end",
            StateKind::Value(_) => "value",
            StateKind::ConjStart => "conj_start",
            StateKind::ConjEnd { .. } => "conj_end",
            StateKind::SeqStart => "seq_start",
            StateKind::SeqEnd => "seq_end",
        }
    }
}

pub(crate) struct State<T> {
    pub(crate) kind: StateKind<T>,
    pub(crate) next: NextStates,
    pub(crate) flags: StateFlags,
}

impl<T> State<T> {
    pub(crate) fn new(kind: StateKind<T>) -> Self {
        Self {
            kind,
            next: NextStates::new(),
            flags: StateFlags::empty(),
        }
    }
}

impl<T> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("kind", &self.kind.name())
            .field("next", &self.next)
            .field("flags", &self.flags)
            .finish()
    }
}
