//! Guarded State Machine
//!
//! A [`StateTable`] is plain data: for every state, either one guarded
//! transition or an ordered list of them. Each tick the machine evaluates all
//! guards of its current state against a snapshot of inputs. At most one guard
//! may hold; two holding at once is a table-authoring defect, rejected when the
//! table is built and again if it ever slips through at runtime.

pub mod table;

pub use table::{agent_state_table, AgentState, GuardInputs};

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Guard inputs that can be listed exhaustively, so tables can be checked
/// for overlapping guards before they are used.
pub trait GuardDomain: Sized {
    fn enumerate() -> Vec<Self>;
}

pub type Guard<C> = fn(&C) -> bool;

pub struct Transition<S, C> {
    pub target: S,
    pub guard: Guard<C>,
    pub label: &'static str,
}

impl<S: Copy, C> Transition<S, C> {
    pub fn new(target: S, guard: Guard<C>, label: &'static str) -> Self {
        Self {
            target,
            guard,
            label,
        }
    }
}

impl<S: Copy, C> Clone for Transition<S, C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            guard: self.guard,
            label: self.label,
        }
    }
}

impl<S: Debug, C> Debug for Transition<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("label", &self.label)
            .finish()
    }
}

/// Outgoing edges of one state.
#[derive(Debug)]
pub enum Transitions<S, C> {
    Single(Transition<S, C>),
    Ordered(Vec<Transition<S, C>>),
}

impl<S: Copy, C> Clone for Transitions<S, C> {
    fn clone(&self) -> Self {
        match self {
            Transitions::Single(t) => Transitions::Single(t.clone()),
            Transitions::Ordered(ts) => Transitions::Ordered(ts.clone()),
        }
    }
}

impl<S, C> Transitions<S, C> {
    pub fn as_slice(&self) -> &[Transition<S, C>] {
        match self {
            Transitions::Single(t) => std::slice::from_ref(t),
            Transitions::Ordered(ts) => ts,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("state {state}: guards {first:?} and {second:?} both hold for {inputs}")]
    OverlappingGuards {
        state: String,
        first: &'static str,
        second: &'static str,
        inputs: String,
    },
    #[error("state {state}: transition {label:?} targets {target}, which has no row")]
    UnknownTarget {
        state: String,
        target: String,
        label: &'static str,
    },
}

/// Declarative transition table, keyed by state.
#[derive(Debug)]
pub struct StateTable<S, C> {
    rows: BTreeMap<S, Transitions<S, C>>,
}

impl<S, C> StateTable<S, C>
where
    S: Copy + Ord + Debug,
    C: GuardDomain + Debug,
{
    pub fn builder() -> StateTableBuilder<S, C> {
        StateTableBuilder {
            rows: BTreeMap::new(),
        }
    }

    pub fn transitions(&self, state: S) -> &[Transition<S, C>] {
        self.rows.get(&state).map(Transitions::as_slice).unwrap_or(&[])
    }

    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        self.rows.keys().copied()
    }

    /// Target of the single guard that holds in `current`, if any.
    ///
    /// # Panics
    ///
    /// Panics when more than one guard holds.
    pub fn evaluate(&self, current: S, inputs: &C) -> Option<S> {
        let mut matched: Option<&Transition<S, C>> = None;
        for transition in self.transitions(current) {
            if !(transition.guard)(inputs) {
                continue;
            }
            if let Some(first) = matched {
                panic!(
                    "overlapping guards in state {:?}: {:?} and {:?} both hold for {:?}",
                    current, first.label, transition.label, inputs
                );
            }
            matched = Some(transition);
        }
        matched.map(|t| t.target)
    }

    fn check(&self) -> Result<(), TableError> {
        let domain = C::enumerate();
        for (state, row) in &self.rows {
            let transitions = row.as_slice();
            for t in transitions {
                if !self.rows.contains_key(&t.target) {
                    return Err(TableError::UnknownTarget {
                        state: format!("{state:?}"),
                        target: format!("{:?}", t.target),
                        label: t.label,
                    });
                }
            }
            for inputs in &domain {
                let mut holding = transitions.iter().filter(|t| (t.guard)(inputs));
                if let (Some(first), Some(second)) = (holding.next(), holding.next()) {
                    return Err(TableError::OverlappingGuards {
                        state: format!("{state:?}"),
                        first: first.label,
                        second: second.label,
                        inputs: format!("{inputs:?}"),
                    });
                }
            }
        }
        Ok(())
    }
}

pub struct StateTableBuilder<S, C> {
    rows: BTreeMap<S, Transitions<S, C>>,
}

impl<S, C> StateTableBuilder<S, C>
where
    S: Copy + Ord + Debug,
    C: GuardDomain + Debug,
{
    pub fn single(mut self, from: S, transition: Transition<S, C>) -> Self {
        self.rows.insert(from, Transitions::Single(transition));
        self
    }

    pub fn ordered(mut self, from: S, transitions: Vec<Transition<S, C>>) -> Self {
        self.rows.insert(from, Transitions::Ordered(transitions));
        self
    }

    /// Checks every state against every possible input before handing the
    /// table out.
    pub fn try_build(self) -> Result<StateTable<S, C>, TableError> {
        let table = StateTable { rows: self.rows };
        table.check()?;
        Ok(table)
    }

    /// # Panics
    ///
    /// Panics if the table has overlapping guards or dangling targets.
    pub fn build(self) -> StateTable<S, C> {
        match self.try_build() {
            Ok(table) => table,
            Err(e) => panic!("invalid state table: {e}"),
        }
    }
}

/// Callbacks run by [`StateMachine::tick`].
pub trait StateHooks<S> {
    fn on_exit(&mut self, state: S);
    fn on_enter(&mut self, state: S);
    fn on_same_state(&mut self, state: S);
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<S> {
    Stayed(S),
    Transitioned { from: S, to: S },
}

/// One machine instance: a shared table plus the active state.
#[derive(Debug)]
pub struct StateMachine<S, C> {
    table: Arc<StateTable<S, C>>,
    current: S,
}

impl<S: Copy, C> Clone for StateMachine<S, C> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            current: self.current,
        }
    }
}

impl<S, C> StateMachine<S, C>
where
    S: Copy + Ord + Debug,
    C: GuardDomain + Debug,
{
    pub fn new(table: Arc<StateTable<S, C>>, initial: S) -> Self {
        Self {
            table,
            current: initial,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Next state for `inputs` without changing anything.
    pub fn transition(&self, inputs: &C) -> S {
        self.table
            .evaluate(self.current, inputs)
            .unwrap_or(self.current)
    }

    /// Evaluates guards, switches state and runs the matching hooks.
    pub fn tick(&mut self, inputs: &C, hooks: &mut impl StateHooks<S>) -> Step<S> {
        match self.table.evaluate(self.current, inputs) {
            Some(next) => {
                let from = self.current;
                hooks.on_exit(from);
                self.current = next;
                hooks.on_enter(next);
                Step::Transitioned { from, to: next }
            }
            None => {
                hooks.on_same_state(self.current);
                Step::Stayed(self.current)
            }
        }
    }
}
