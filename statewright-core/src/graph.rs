//! State graph construction.
//!
//! Builds the state arena in two passes: every state is created first, then
//! transitions are wired, so a definition may reference states declared
//! later in the same text.

use crate::binding::{BoundHook, MethodBindings};
use crate::condition::ConditionRegistry;
use crate::error::DefinitionError;
use crate::grammar::StateDecl;
use crate::state::{State, StateId};
use std::collections::HashMap;

/// A fully wired state arena.
#[derive(Debug)]
pub(crate) struct StateGraph {
    pub(crate) states: Vec<State>,
    pub(crate) index: HashMap<String, StateId>,
    pub(crate) initial: StateId,
}

/// Builds the graph described by `decls`.
pub(crate) fn build(
    decls: &[StateDecl],
    bindings: &MethodBindings,
    registry: &ConditionRegistry,
) -> Result<StateGraph, DefinitionError> {
    if decls.is_empty() {
        return Err(DefinitionError::NoStates);
    }

    let mut states: Vec<State> = Vec::with_capacity(decls.len());
    let mut index: HashMap<String, StateId> = HashMap::with_capacity(decls.len());

    for decl in decls {
        let name = &decl.header.name;
        if index.contains_key(name) {
            return Err(DefinitionError::DuplicateState {
                state: name.clone(),
            });
        }

        let on_enter = resolve_hook(decl.header.on_enter.as_deref(), name, bindings)?;
        let on_leave = resolve_hook(decl.header.on_leave.as_deref(), name, bindings)?;

        let id = StateId(states.len());
        states.push(State::new(id, name.clone(), on_enter, on_leave));
        index.insert(name.clone(), id);
    }

    for (decl, state) in decls.iter().zip(states.iter_mut()) {
        for token in &decl.transitions {
            let target = index.get(&token.target).copied().ok_or_else(|| {
                DefinitionError::UnknownTarget {
                    state: state.name.clone(),
                    condition: token.condition.clone(),
                    target: token.target.clone(),
                }
            })?;

            let condition = registry.get_or_create(&token.condition);
            if !state.add_transition(condition, target) {
                return Err(DefinitionError::DuplicateCondition {
                    state: state.name.clone(),
                    condition: token.condition.clone(),
                });
            }
        }
    }

    Ok(StateGraph {
        states,
        index,
        initial: StateId(0),
    })
}

fn resolve_hook(
    method: Option<&str>,
    state: &str,
    bindings: &MethodBindings,
) -> Result<Option<BoundHook>, DefinitionError> {
    let Some(method) = method else {
        return Ok(None);
    };

    bindings
        .get(method)
        .cloned()
        .map(Some)
        .ok_or_else(|| DefinitionError::MissingMethod {
            state: state.to_string(),
            method: method.to_string(),
        })
}
