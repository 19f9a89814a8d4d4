//! State machine runtime.
//!
//! A [`StateMachine`] is compiled from a definition string and a set of
//! hosts. After construction it cannot fail: conditions the current state
//! does not declare are ignored, and forced transitions to unknown states
//! return `false`.

use crate::binding::{Host, MethodBindings};
use crate::condition::{Condition, ConditionRegistry};
use crate::error::DefinitionError;
use crate::grammar;
use crate::graph;
use crate::state::{State, StateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builder for a [`StateMachine`].
pub struct StateMachineBuilder {
    definition: String,
    hosts: Vec<Host>,
    registry: Option<Arc<ConditionRegistry>>,
}

impl StateMachineBuilder {
    /// Adds a host whose hooks may be referenced by the definition.
    pub fn host(mut self, host: Host) -> Self {
        self.hosts.push(host);
        self
    }

    pub fn hosts(mut self, hosts: impl IntoIterator<Item = Host>) -> Self {
        self.hosts.extend(hosts);
        self
    }

    /// Interns conditions in `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<ConditionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Compiles the definition and enters the initial state.
    pub fn build(self) -> Result<StateMachine, DefinitionError> {
        let registry = self.registry.unwrap_or_else(ConditionRegistry::global);

        let decls = grammar::parse(&self.definition)?;
        let bindings = MethodBindings::resolve(&self.hosts)?;
        let graph = graph::build(&decls, &bindings, &registry)?;

        let normalized = grammar::normalize(&self.definition);
        let checksum = format!("{:08x}", crc32c::crc32c(normalized.as_bytes()));

        let machine = StateMachine {
            states: graph.states,
            index: graph.index,
            initial: graph.initial,
            current: graph.initial,
            registry,
            checksum,
        };

        tracing::debug!(
            "built state machine: {} states, initial '{}', checksum {}",
            machine.states.len(),
            machine.initial().name(),
            machine.checksum
        );

        machine.current().enter();
        Ok(machine)
    }
}

/// A compiled state graph plus the current position in it.
pub struct StateMachine {
    states: Vec<State>,
    index: HashMap<String, StateId>,
    initial: StateId,
    current: StateId,
    registry: Arc<ConditionRegistry>,
    checksum: String,
}

impl StateMachine {
    /// Compiles `definition` against `hosts` using the process-wide registry.
    pub fn new(definition: &str, hosts: &[Host]) -> Result<Self, DefinitionError> {
        Self::builder(definition).hosts(hosts.iter().cloned()).build()
    }

    pub fn builder(definition: impl Into<String>) -> StateMachineBuilder {
        StateMachineBuilder {
            definition: definition.into(),
            hosts: Vec::new(),
            registry: None,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Follows the transition labelled `condition` from the current state.
    ///
    /// Runs the current state's leave hook, then the target's enter hook, and
    /// returns the new state. A condition the current state does not declare
    /// is ignored: nothing runs and `None` is returned.
    pub fn change_state(&mut self, condition: &Condition) -> Option<&State> {
        let Some(target) = self.current().target(condition.name()) else {
            tracing::debug!(
                "condition '{}' not declared for state '{}', ignoring",
                condition,
                self.current().name()
            );
            return None;
        };

        tracing::debug!(
            "'{}' --{}--> '{}'",
            self.current().name(),
            condition,
            self.states[target.0].name()
        );

        self.current().leave();
        self.states[target.0].enter();
        self.current = target;
        Some(self.current())
    }

    /// Like [`change_state`](Self::change_state), interning `condition`
    /// through this machine's registry first.
    pub fn change_state_by_name(&mut self, condition: &str) -> Option<&State> {
        let condition = self.registry.get_or_create(condition);
        self.change_state(&condition)
    }

    /// Forces a transition to the state called `name`, running hooks.
    ///
    /// Returns false, without running anything, if `name` is unknown or is
    /// already the current state.
    pub fn set_state(&mut self, name: &str) -> bool {
        self.force(name, true)
    }

    /// Like [`set_state`](Self::set_state) but never runs hooks. Used to
    /// resynchronize with a state observed elsewhere.
    pub fn set_state_no_invoke(&mut self, name: &str) -> bool {
        self.force(name, false)
    }

    fn force(&mut self, name: &str, invoke: bool) -> bool {
        let Some(&target) = self.index.get(name) else {
            tracing::debug!("cannot force unknown state '{}'", name);
            return false;
        };
        if target == self.current {
            return false;
        }

        tracing::debug!(
            "forcing '{}' -> '{}' (hooks: {})",
            self.current().name(),
            name,
            invoke
        );

        if invoke {
            self.current().leave();
        }
        self.current = target;
        if invoke {
            self.current().enter();
        }
        true
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The state `condition` would lead to from the current state, without
    /// transitioning.
    pub fn peek(&self, condition: &Condition) -> Option<&State> {
        self.peek_by_name(condition.name())
    }

    pub fn peek_by_name(&self, condition: &str) -> Option<&State> {
        self.current()
            .target(condition)
            .map(|target| &self.states[target.0])
    }

    pub fn is_in_state(&self, name: &str) -> bool {
        self.current().name() == name
    }

    pub fn is_in(&self, state: &State) -> bool {
        self.is_in_state(state.name())
    }

    pub fn current(&self) -> &State {
        &self.states[self.current.0]
    }

    pub fn initial(&self) -> &State {
        &self.states[self.initial.0]
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|id| &self.states[id.0])
    }

    pub fn state_by_id(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    /// All states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Conditions declared by the current state, in declaration order.
    pub fn available_conditions(&self) -> Vec<&Condition> {
        self.current().transitions().map(|(c, _)| c).collect()
    }

    /// crc32c of the whitespace-normalized definition.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn registry(&self) -> &Arc<ConditionRegistry> {
        &self.registry
    }

    /// Serializable snapshot of the graph and current position.
    pub fn describe(&self) -> MachineDescription {
        MachineDescription {
            initial: self.initial().name().to_string(),
            current: self.current().name().to_string(),
            checksum: self.checksum.clone(),
            states: self
                .states
                .iter()
                .map(|state| StateDescription {
                    name: state.name().to_string(),
                    on_enter: state.on_enter().map(str::to_string),
                    on_leave: state.on_leave().map(str::to_string),
                    transitions: state
                        .transitions()
                        .map(|(condition, target)| TransitionDescription {
                            condition: condition.name().to_string(),
                            target: self.states[target.0].name().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in &self.states {
            writeln!(f, "{}", state.name())?;
            for (condition, target) in state.transitions() {
                writeln!(f, "  {} -> {}", condition, self.states[target.0].name())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current().name())
            .field("states", &self.states.len())
            .field("checksum", &self.checksum)
            .finish()
    }
}

/// Snapshot of a machine, produced by [`StateMachine::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDescription {
    pub initial: String,
    pub current: String,
    pub checksum: String,
    pub states: Vec<StateDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_leave: Option<String>,
    pub transitions: Vec<TransitionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub condition: String,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Host whose hooks append their own name to a shared log.
    fn recording_host(names: &[&str]) -> (Host, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = Host::new("recorder");
        for name in names {
            let log = log.clone();
            let entry = name.to_string();
            host = host.hook(*name, move || log.lock().push(entry.clone()));
        }
        (host, log)
    }

    fn isolated(definition: &str, host: Host) -> StateMachine {
        StateMachine::builder(definition)
            .host(host)
            .registry(Arc::new(ConditionRegistry::new()))
            .build()
            .unwrap()
    }

    const WORKFLOW: &str = "(Idle, EnterIdle, LeaveIdle) -> {START: Busy};
                            (Busy, EnterBusy, LeaveBusy) -> {DONE: Idle, FAIL: Error};
                            (Error, EnterError) -> {RESET: Idle};";

    fn workflow() -> (StateMachine, Arc<Mutex<Vec<String>>>) {
        let (host, log) = recording_host(&[
            "EnterIdle",
            "LeaveIdle",
            "EnterBusy",
            "LeaveBusy",
            "EnterError",
        ]);
        (isolated(WORKFLOW, host), log)
    }

    #[test]
    fn test_initial_enter_fires_once() {
        let (machine, log) = workflow();
        assert!(machine.is_in_state("Idle"));
        assert_eq!(machine.initial().name(), "Idle");
        assert_eq!(*log.lock(), vec!["EnterIdle"]);
    }

    #[test]
    fn test_change_state_runs_leave_then_enter() {
        let (mut machine, log) = workflow();
        log.lock().clear();

        let state = machine.change_state_by_name("START").unwrap();
        assert_eq!(state.name(), "Busy");
        assert_eq!(*log.lock(), vec!["LeaveIdle", "EnterBusy"]);

        machine.change_state_by_name("FAIL").unwrap();
        assert!(machine.is_in_state("Error"));
        assert_eq!(
            *log.lock(),
            vec!["LeaveIdle", "EnterBusy", "LeaveBusy", "EnterError"]
        );
    }

    #[test]
    fn test_undeclared_condition_is_ignored() {
        let (mut machine, log) = workflow();
        let before = log.lock().len();

        assert!(machine.change_state_by_name("DONE").is_none());
        assert!(machine.change_state_by_name("UNDECLARED").is_none());
        assert!(machine.is_in_state("Idle"));
        assert_eq!(log.lock().len(), before);
    }

    #[test]
    fn test_change_state_with_interned_condition() {
        let registry = Arc::new(ConditionRegistry::new());
        let mut machine = StateMachine::builder("(A)->{GO:B};(B)->{}")
            .registry(registry.clone())
            .build()
            .unwrap();

        let go = registry.get_or_create("GO");
        assert_eq!(machine.change_state(&go).map(State::name), Some("B"));
        assert!(machine.change_state(&go).is_none());
    }

    #[test]
    fn test_set_state() {
        let (mut machine, log) = workflow();
        log.lock().clear();

        assert!(machine.set_state("Error"));
        assert!(machine.is_in_state("Error"));
        assert_eq!(*log.lock(), vec!["LeaveIdle", "EnterError"]);
    }

    #[test]
    fn test_set_state_rejects_current_and_unknown() {
        let (mut machine, log) = workflow();
        log.lock().clear();

        assert!(!machine.set_state("Idle"));
        assert!(!machine.set_state("Nowhere"));
        assert!(!machine.set_state_no_invoke("Idle"));
        assert!(!machine.set_state_no_invoke("Nowhere"));
        assert!(machine.is_in_state("Idle"));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_set_state_no_invoke() {
        let (mut machine, log) = workflow();
        log.lock().clear();

        assert!(machine.set_state_no_invoke("Busy"));
        assert!(machine.is_in_state("Busy"));
        assert!(log.lock().is_empty());

        // Transitions continue from the resynchronized state.
        machine.change_state_by_name("DONE").unwrap();
        assert_eq!(*log.lock(), vec!["LeaveBusy", "EnterIdle"]);
    }

    #[test]
    fn test_self_transition_runs_hooks() {
        let (host, log) = recording_host(&["In", "Out"]);
        let mut machine = isolated("(A, In, Out) -> {AGAIN: A}", host);
        log.lock().clear();

        machine.change_state_by_name("AGAIN").unwrap();
        assert!(machine.is_in_state("A"));
        assert_eq!(*log.lock(), vec!["Out", "In"]);
    }

    #[test]
    fn test_peek_does_not_move() {
        let (machine, log) = workflow();
        let before = log.lock().len();

        assert_eq!(machine.peek_by_name("START").map(State::name), Some("Busy"));
        assert!(machine.peek_by_name("DONE").is_none());
        assert!(machine.is_in_state("Idle"));
        assert_eq!(log.lock().len(), before);
    }

    #[test]
    fn test_is_in() {
        let (mut machine, _log) = workflow();
        machine.set_state_no_invoke("Busy");
        let busy = machine.state("Busy").unwrap().clone();
        assert!(machine.is_in(&busy));
        assert!(!machine.is_in_state("Idle"));
    }

    #[test]
    fn test_inspection() {
        let (machine, _log) = workflow();
        assert_eq!(machine.len(), 3);
        let names: Vec<&str> = machine.states().map(State::name).collect();
        assert_eq!(names, vec!["Idle", "Busy", "Error"]);

        let busy = machine.state("Busy").unwrap();
        assert_eq!(machine.state_by_id(busy.id()).map(State::name), Some("Busy"));
        assert_eq!(machine.checksum().len(), 8);

        let conditions: Vec<&str> = machine
            .available_conditions()
            .into_iter()
            .map(Condition::name)
            .collect();
        assert_eq!(conditions, vec!["START"]);
    }

    #[test]
    fn test_checksum_ignores_whitespace() {
        let a = isolated("(A)->{GO:A}", Host::new("none"));
        let b = isolated("( A ) ->\n{ GO : A }", Host::new("none"));
        let c = isolated("(A)->{STAY:A}", Host::new("none"));
        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_display_lists_states_and_transitions() {
        let (machine, _log) = workflow();
        let rendered = machine.to_string();
        assert_eq!(
            rendered,
            "Idle\n  START -> Busy\nBusy\n  DONE -> Idle\n  FAIL -> Error\nError\n  RESET -> Idle\n"
        );
        assert!(!rendered.contains("EnterIdle"));
    }

    #[test]
    fn test_describe_serializes() {
        let (machine, _log) = workflow();
        let description = machine.describe();
        assert_eq!(description.current, "Idle");
        assert_eq!(description.states[1].on_leave.as_deref(), Some("LeaveBusy"));
        assert_eq!(description.states[2].on_leave, None);

        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(json["states"][1]["transitions"][1]["target"], "Error");
        assert!(json["states"][2].get("on_leave").is_none());
    }

    #[test]
    fn test_failed_construction_runs_no_hooks() {
        let (host, log) = recording_host(&["EnterA"]);
        let result = StateMachine::builder("(A, EnterA) -> {X: B}")
            .host(host)
            .registry(Arc::new(ConditionRegistry::new()))
            .build();

        assert!(matches!(result, Err(DefinitionError::UnknownTarget { .. })));
        assert!(log.lock().is_empty());
    }
}
