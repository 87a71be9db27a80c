use smallvec::SmallVec;

use super::ast::PatternExpr;
use super::error::{PatternError, PatternResult};
use super::state::{State, StateFlags, StateId, StateKind};

/// Greedy repeats with bounds up to this size are unrolled into copies.
pub(crate) const UNROLL_LIMIT: usize = 10;

pub(crate) type Exits = SmallVec<[StateId; 4]>;

/// Partially built automaton: one entry state and the states whose
/// outgoing edges are still unconnected.
#[derive(Debug)]
pub(crate) struct Frag {
    pub(crate) start: StateId,
    pub(crate) out: Exits,
}

pub(crate) struct Compiler<T> {
    pub(crate) states: Vec<State<T>>,
    total_groups: usize,
}

impl<T> Compiler<T> {
    pub(crate) fn new(total_groups: usize) -> Self {
        Self {
            states: Vec::new(),
            total_groups,
        }
    }

    pub(crate) fn add(&mut self, kind: StateKind<T>) -> StateId {
        let id = StateId::new(self.states.len());
        self.states.push(State::new(kind));
        id
    }

    fn single(&mut self, kind: StateKind<T>) -> Frag {
        let id = self.add(kind);
        Frag {
            start: id,
            out: SmallVec::from_slice(&[id]),
        }
    }

    fn mark_since(&mut self, from: usize, flag: StateFlags) {
        for state in &mut self.states[from..] {
            state.flags |= flag;
        }
    }

    pub(crate) fn link(&mut self, exits: &[StateId], next: StateId) {
        for exit in exits {
            self.states[exit.index()].next.push(next);
        }
    }

    /// Links the exits of `frag` to `next` and takes over `next`'s exits.
    fn connect(&mut self, frag: &mut Frag, next: Frag) {
        self.link(&frag.out, next.start);
        frag.out = next.out;
    }

    fn append(&mut self, frag: &mut Option<Frag>, next: Frag) {
        match frag {
            Some(frag) => self.connect(frag, next),
            None => *frag = Some(next),
        }
    }
}

impl<T> PatternExpr<T> {
    pub(crate) fn build(&self, c: &mut Compiler<T>) -> PatternResult<Frag> {
        match self {
            PatternExpr::Node(p) => Ok(c.single(StateKind::Node(p.clone()))),
            PatternExpr::MultiNode(p) => Ok(c.single(StateKind::MultiNode(p.clone()))),
            PatternExpr::Sequence(children) => {
                let mut frag = None;
                for child in children {
                    let next = child.build(c)?;
                    c.append(&mut frag, next);
                }
                Ok(frag.unwrap_or_else(|| c.single(StateKind::Split)))
            }
            PatternExpr::Or(children) => {
                if children.is_empty() {
                    return Err(PatternError::EmptyAlternation { kind: "or" });
                }
                let split = c.add(StateKind::Split);
                let mut out = Exits::new();
                for child in children {
                    let from = c.states.len();
                    let frag = child.build(c)?;
                    if children.len() > 1 {
                        c.mark_since(from, StateFlags::BRANCHED);
                    }
                    c.states[split.index()].next.push(frag.start);
                    out.extend(frag.out);
                }
                Ok(Frag { start: split, out })
            }
            PatternExpr::And(children) => {
                if children.is_empty() {
                    return Err(PatternError::EmptyAlternation { kind: "and" });
                }
                let start = c.add(StateKind::ConjStart);
                let mut out = Exits::new();
                for (index, child) in children.iter().enumerate() {
                    let from = c.states.len();
                    let frag = child.build(c)?;
                    if children.len() > 1 {
                        c.mark_since(from, StateFlags::BRANCHED);
                    }
                    c.states[start.index()].next.push(frag.start);
                    let end = c.add(StateKind::ConjEnd { start, index });
                    c.link(&frag.out, end);
                    out.push(end);
                }
                Ok(Frag { start, out })
            }
            PatternExpr::Repeat {
                inner,
                min,
                max,
                greedy,
            } => build_repeat(c, inner, *min, *max, *greedy),
            PatternExpr::Group {
                inner,
                capture: true,
                id: Some(id),
                ..
            } => {
                let start = c.add(StateKind::GroupStart(*id));
                let mut frag = inner.build(c)?;
                c.states[start.index()].next.push(frag.start);
                let end = c.single(StateKind::GroupEnd(*id));
                c.connect(&mut frag, end);
                Ok(Frag {
                    start,
                    out: frag.out,
                })
            }
            PatternExpr::Group { inner, .. } => inner.build(c),
            PatternExpr::BackRef { group, equality } => {
                if *group == 0 || *group >= c.total_groups {
                    return Err(PatternError::InvalidBackReference {
                        group: *group,
                        total_groups: c.total_groups,
                    });
                }
                Ok(c.single(StateKind::BackRef {
                    group: *group,
                    equality: equality.clone(),
                }))
            }
            PatternExpr::Value { inner, payload } => {
                let mut frag = inner.build(c)?;
                let value = c.single(StateKind::Value(payload.clone()));
                c.connect(&mut frag, value);
                Ok(frag)
            }
            PatternExpr::SeqStart => Ok(c.single(StateKind::SeqStart)),
            PatternExpr::SeqEnd => Ok(c.single(StateKind::SeqEnd)),
        }
    }
}

fn build_repeat<T>(
    c: &mut Compiler<T>,
    inner: &PatternExpr<T>,
    min: usize,
    max: Option<usize>,
    greedy: bool,
) -> PatternResult<Frag> {
    if let Some(max) = max
        && min > max
    {
        return Err(PatternError::InvalidRepeatBounds { min, max });
    }
    match max {
        Some(0) => return Ok(c.single(StateKind::Split)),
        Some(1) if min == 1 => return inner.build(c),
        _ => {}
    }

    if greedy && min <= UNROLL_LIMIT && max.is_none_or(|max| max <= UNROLL_LIMIT) {
        return unroll_repeat(c, inner, min, max);
    }

    let from = c.states.len();
    let body = inner.build(c)?;
    if min == 0 {
        c.mark_since(from, StateFlags::OPTIONAL);
    }
    let repeat = c.add(StateKind::Repeat {
        body: body.start,
        min,
        max,
        greedy,
    });
    let end = c.add(StateKind::RepeatEnd { repeat });
    c.link(&body.out, end);
    Ok(Frag {
        start: repeat,
        out: SmallVec::from_slice(&[repeat]),
    })
}

/// `min` mandatory copies, then either a self-looping optional copy
/// (unbounded) or `max - min` nested optional copies whose skip edges all
/// lead to the exit.
fn unroll_repeat<T>(
    c: &mut Compiler<T>,
    inner: &PatternExpr<T>,
    min: usize,
    max: Option<usize>,
) -> PatternResult<Frag> {
    let mut frag = None;
    for _ in 0..min {
        let copy = inner.build(c)?;
        c.append(&mut frag, copy);
    }

    match max {
        None => {
            let from = c.states.len();
            let split = c.add(StateKind::Split);
            let body = inner.build(c)?;
            c.mark_since(from, StateFlags::OPTIONAL);
            c.states[split.index()].next.push(body.start);
            c.link(&body.out, split);
            c.append(
                &mut frag,
                Frag {
                    start: split,
                    out: SmallVec::from_slice(&[split]),
                },
            );
        }
        Some(max) => {
            let mut skips = Exits::new();
            for _ in min..max {
                let from = c.states.len();
                let split = c.add(StateKind::Split);
                let body = inner.build(c)?;
                c.mark_since(from, StateFlags::OPTIONAL);
                c.states[split.index()].next.push(body.start);
                c.append(
                    &mut frag,
                    Frag {
                        start: split,
                        out: body.out,
                    },
                );
                skips.push(split);
            }
            if let Some(frag) = frag.as_mut() {
                frag.out.extend(skips);
            }
        }
    }

    Ok(frag.unwrap_or_else(|| c.single(StateKind::Split)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::EqualsNode;

    fn build(expr: PatternExpr<char>, total_groups: usize) -> PatternResult<(Compiler<char>, Frag)> {
        let mut c = Compiler::new(total_groups);
        let frag = expr.build(&mut c)?;
        Ok((c, frag))
    }

    fn count(c: &Compiler<char>, name: &str) -> usize {
        c.states.iter().filter(|s| s.kind.name() == name).count()
    }

    #[test]
    fn small_greedy_repeat_is_unrolled() {
        let expr = PatternExpr::repeat(PatternExpr::node(EqualsNode('x')), 2, Some(4), true);
        let (c, frag) = build(expr, 1).expect("repeat should build");
        assert_eq!(count(&c, "node"), 4);
        assert_eq!(count(&c, "repeat"), 0);
        // two skip edges plus the last optional copy
        assert_eq!(frag.out.len(), 3);
        let optional = c
            .states
            .iter()
            .filter(|s| s.flags.contains(StateFlags::OPTIONAL) && s.kind.name() == "node")
            .count();
        assert_eq!(optional, 2);
    }

    #[test]
    fn reluctant_or_large_repeat_uses_counted_loop() {
        let reluctant = PatternExpr::repeat(PatternExpr::node(EqualsNode('x')), 2, Some(4), false);
        let (c, frag) = build(reluctant, 1).expect("repeat should build");
        assert_eq!(count(&c, "node"), 1);
        assert_eq!(count(&c, "repeat"), 1);
        assert_eq!(count(&c, "repeat_end"), 1);
        assert_eq!(c.states[frag.start.index()].kind.name(), "repeat");

        let large = PatternExpr::repeat(PatternExpr::node(EqualsNode('x')), 0, Some(40), true);
        let (c, _) = build(large, 1).expect("repeat should build");
        assert_eq!(count(&c, "node"), 1);
    }

    #[test]
    fn unbounded_copy_loops_back_to_its_split() {
        let expr = PatternExpr::plus(PatternExpr::node(EqualsNode('x')));
        let (c, frag) = build(expr, 1).expect("repeat should build");
        assert_eq!(frag.out.len(), 1);
        let split = frag.out[0];
        let body = c.states[split.index()].next[0];
        assert_eq!(c.states[body.index()].next.as_slice(), &[split]);
    }

    #[test]
    fn inconsistent_bounds_fail() {
        let expr = PatternExpr::repeat(PatternExpr::node(EqualsNode('x')), 3, Some(2), true);
        match build(expr, 1) {
            Err(PatternError::InvalidRepeatBounds { min: 3, max: 2 }) => {}
            other => panic!("unexpected result: {:?}", other.map(|(_, f)| f)),
        }
    }

    #[test]
    fn backreference_must_name_an_earlier_group() {
        match build(PatternExpr::back_ref(2), 2) {
            Err(PatternError::InvalidBackReference { group: 2, .. }) => {}
            other => panic!("unexpected result: {:?}", other.map(|(_, f)| f)),
        }
        match build(PatternExpr::back_ref(0), 2) {
            Err(PatternError::InvalidBackReference { group: 0, .. }) => {}
            other => panic!("unexpected result: {:?}", other.map(|(_, f)| f)),
        }
    }

    #[test]
    fn conjunction_ends_are_the_exits() {
        let expr = PatternExpr::and(vec![
            PatternExpr::node(EqualsNode('a')),
            PatternExpr::node(EqualsNode('b')),
        ]);
        let (c, frag) = build(expr, 1).expect("conjunction should build");
        assert_eq!(frag.out.len(), 2);
        assert!(frag.out.iter().all(|s| c.states[s.index()].kind.name() == "conj_end"));
        assert_eq!(c.states[frag.start.index()].next.len(), 2);
    }
}
