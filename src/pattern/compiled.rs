use std::collections::VecDeque;
use std::fmt;

use hashbrown::HashSet as FastHashSet;

use crate::matcher::{MatcherOptions, MatcherResult, SequenceMatcher};
use crate::node::{NodePattern, SharedNodePattern};
use crate::types::GroupId;

use super::ast::PatternExpr;
use super::bindings::VarGroupBindings;
use super::compile::Compiler;
use super::error::PatternResult;
use super::state::{State, StateFlags, StateId, StateKind};

/// A compiled, immutable sequence pattern. Cheap to share across threads;
/// each search runs in its own [`SequenceMatcher`].
pub struct SequencePattern<T> {
    expr: PatternExpr<T>,
    states: Vec<State<T>>,
    root: StateId,
    match_state: StateId,
    total_groups: usize,
    bindings: VarGroupBindings,
    priority: f64,
    weight: f64,
}

impl<T> SequencePattern<T> {
    /// Wraps `expr` in capture group 0, numbers its groups, and builds the
    /// state graph.
    #[tracing::instrument(level = "trace", skip(expr), fields(expr = %expr))]
    pub fn compile(mut expr: PatternExpr<T>) -> PatternResult<Self> {
        let total_groups = expr.assign_group_ids(1);
        let mut bindings = VarGroupBindings::new(total_groups);
        expr.update_bindings(&mut bindings);

        let root = PatternExpr::Group {
            inner: Box::new(expr.clone()),
            capture: true,
            name: None,
            id: Some(0),
        };
        let mut compiler = Compiler::new(total_groups);
        let frag = root.build(&mut compiler)?;
        let match_state = compiler.add(StateKind::Match);
        compiler.link(&frag.out, match_state);

        tracing::event!(
            tracing::Level::TRACE,
            operation = "compile",
            states = compiler.states.len() as u64,
            groups = total_groups as u64
        );

        Ok(Self {
            expr,
            states: compiler.states,
            root: frag.start,
            match_state,
            total_groups,
            bindings,
            priority: 0.0,
            weight: 0.0,
        })
    }

    pub fn matcher<'p, 'e>(&'p self, elements: &'e [T]) -> SequenceMatcher<'p, 'e, T> {
        SequenceMatcher::new(self, elements, MatcherOptions::default())
    }

    pub fn matcher_with_options<'p, 'e>(
        &'p self,
        elements: &'e [T],
        options: MatcherOptions,
    ) -> MatcherResult<SequenceMatcher<'p, 'e, T>> {
        options.validate()?;
        Ok(SequenceMatcher::new(self, elements, options))
    }

    /// The expression this pattern was compiled from, with group ids assigned.
    pub fn pattern_expr(&self) -> &PatternExpr<T> {
        &self.expr
    }

    /// Number of capture groups, including group 0.
    pub fn total_groups(&self) -> usize {
        self.total_groups
    }

    pub fn var_group_bindings(&self) -> &VarGroupBindings {
        &self.bindings
    }

    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.bindings.group_id(name)
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: f64) {
        self.priority = priority;
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Node patterns reachable from the start of the pattern that pass
    /// `filter`, in breadth-first order. Patterns inside skippable parts
    /// are left out unless `allow_optional` is set; patterns inside one of
    /// several alternatives or conjuncts are left out unless
    /// `allow_branching` is set.
    pub fn find_node_patterns<F>(
        &self,
        filter: F,
        allow_optional: bool,
        allow_branching: bool,
    ) -> Vec<SharedNodePattern<T>>
    where
        F: Fn(&dyn NodePattern<T>) -> bool,
    {
        let mut found = Vec::new();
        let mut seen = FastHashSet::new();
        let mut todo = VecDeque::from([self.root]);
        seen.insert(self.root);

        while let Some(id) = todo.pop_front() {
            let state = self.state(id);
            if let StateKind::Node(pattern) = &state.kind
                && (allow_optional || !state.flags.contains(StateFlags::OPTIONAL))
                && (allow_branching || !state.flags.contains(StateFlags::BRANCHED))
                && filter(&**pattern)
            {
                found.push(pattern.clone());
            }
            let body = match &state.kind {
                StateKind::Repeat { body, .. } => Some(*body),
                _ => None,
            };
            for next in state.next.iter().copied().chain(body) {
                if seen.insert(next) {
                    todo.push_back(next);
                }
            }
        }
        found
    }

    /// First node pattern passing `filter`, anywhere in the pattern.
    pub fn find_node_pattern<F>(&self, filter: F) -> Option<SharedNodePattern<T>>
    where
        F: Fn(&dyn NodePattern<T>) -> bool,
    {
        self.find_node_patterns(filter, true, true).into_iter().next()
    }

    pub(crate) fn state(&self, id: StateId) -> &State<T> {
        &self.states[id.index()]
    }

    pub(crate) fn root(&self) -> StateId {
        self.root
    }

    pub(crate) fn match_state(&self) -> StateId {
        self.match_state
    }
}

impl<T> fmt::Display for SequencePattern<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

impl<T> fmt::Debug for SequencePattern<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencePattern")
            .field("expr", &self.expr)
            .field("states", &self.states.len())
            .field("total_groups", &self.total_groups)
            .field("bindings", &self.bindings)
            .field("priority", &self.priority)
            .field("weight", &self.weight)
            .finish()
    }
}
