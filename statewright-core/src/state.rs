//! State graph nodes.

use crate::binding::BoundHook;
use crate::condition::Condition;
use std::collections::HashMap;

/// Index of a state in its machine's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named node with optional enter/leave hooks and outgoing transitions.
///
/// Transitions point at other states by [`StateId`]; the owning
/// [`StateMachine`](crate::StateMachine) resolves them.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) id: StateId,
    pub(crate) name: String,
    pub(crate) on_enter: Option<BoundHook>,
    pub(crate) on_leave: Option<BoundHook>,
    pub(crate) transitions: HashMap<Condition, StateId>,
    /// Conditions in declaration order.
    pub(crate) order: Vec<Condition>,
}

impl State {
    pub(crate) fn new(
        id: StateId,
        name: String,
        on_enter: Option<BoundHook>,
        on_leave: Option<BoundHook>,
    ) -> Self {
        Self {
            id,
            name,
            on_enter,
            on_leave,
            transitions: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the enter hook, if one was declared.
    pub fn on_enter(&self) -> Option<&str> {
        self.on_enter.as_ref().map(BoundHook::name)
    }

    /// Name of the leave hook, if one was declared.
    pub fn on_leave(&self) -> Option<&str> {
        self.on_leave.as_ref().map(BoundHook::name)
    }

    /// Target of the transition labelled `condition`.
    pub fn target(&self, condition: &str) -> Option<StateId> {
        self.transitions.get(condition).copied()
    }

    pub fn has_transition(&self, condition: &str) -> bool {
        self.transitions.contains_key(condition)
    }

    /// Outgoing transitions in declaration order.
    pub fn transitions(&self) -> impl Iterator<Item = (&Condition, StateId)> {
        self.order
            .iter()
            .filter_map(|c| self.transitions.get(c).map(|target| (c, *target)))
    }

    /// Adds a transition. Returns false if the condition is already taken.
    pub(crate) fn add_transition(&mut self, condition: Condition, target: StateId) -> bool {
        if self.transitions.contains_key(&condition) {
            return false;
        }
        self.order.push(condition.clone());
        self.transitions.insert(condition, target);
        true
    }

    pub(crate) fn enter(&self) {
        if let Some(hook) = &self.on_enter {
            hook.invoke();
        }
    }

    pub(crate) fn leave(&self) {
        if let Some(hook) = &self.on_leave {
            hook.invoke();
        }
    }
}
