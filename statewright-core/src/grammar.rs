//! Definition grammar.
//!
//! A definition is a `;`-separated list of state definitions:
//!
//! ```text
//! Definition  := StateDef (';' StateDef)*
//! StateDef    := '(' Header ')' '->' '{' Transitions? '}'
//! Header      := Name (',' Name (',' Name)?)?      // name[, onEnter[, onLeave]]
//! Transitions := Transition (',' Transition)*
//! Transition  := CondName ':' TargetName
//! ```
//!
//! Whitespace is insignificant anywhere in the text, and a trailing `;` or `,`
//! is tolerated. Examples:
//!
//! - `(Init) -> {START: Running}; (Running, OnRun) -> {STOP: Init};`
//! - `(Idle, OnIdle, OnLeaveIdle) -> {}`
//!
//! Parsing only checks shape. Dangling targets and duplicate names are caught
//! later by the graph builder.

use crate::error::DefinitionError;

const STATE_SEPARATOR: char = ';';
const ARROW: &str = "->";
const FIELD_SEPARATOR: char = ',';
const PAIR_SEPARATOR: char = ':';

/// A state's declared name and optional hook names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateHeader {
    pub name: String,
    pub on_enter: Option<String>,
    pub on_leave: Option<String>,
}

/// A `condition:target` pair as written in the definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionToken {
    pub condition: String,
    pub target: String,
}

/// One parsed state definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDecl {
    pub header: StateHeader,
    pub transitions: Vec<TransitionToken>,
}

/// Removes every whitespace character from the definition.
pub fn normalize(definition: &str) -> String {
    definition.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parses a definition into state declarations, in declaration order.
pub fn parse(definition: &str) -> Result<Vec<StateDecl>, DefinitionError> {
    let normalized = normalize(definition);

    let decls = normalized
        .split(STATE_SEPARATOR)
        .filter(|fragment| !fragment.is_empty())
        .map(parse_state)
        .collect::<Result<Vec<_>, _>>()?;

    if decls.is_empty() {
        return Err(DefinitionError::NoStates);
    }

    Ok(decls)
}

/// Lists every hook name referenced by the declarations, without duplicates,
/// in order of first appearance.
pub fn hook_names(decls: &[StateDecl]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for decl in decls {
        for name in [&decl.header.on_enter, &decl.header.on_leave]
            .into_iter()
            .flatten()
        {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }
    names
}

fn parse_state(fragment: &str) -> Result<StateDecl, DefinitionError> {
    let parts: Vec<&str> = fragment.split(ARROW).collect();
    let [header, body] = parts.as_slice() else {
        return Err(DefinitionError::MalformedStateDefinition {
            fragment: fragment.to_string(),
        });
    };

    let header = parse_header(&header.replace(['(', ')'], ""), fragment)?;
    let transitions = parse_transitions(&body.replace(['{', '}'], ""), &header.name)?;

    Ok(StateDecl {
        header,
        transitions,
    })
}

fn parse_header(header: &str, fragment: &str) -> Result<StateHeader, DefinitionError> {
    let fields: Vec<&str> = header.split(FIELD_SEPARATOR).collect();
    if fields.len() > 3 {
        return Err(DefinitionError::MalformedHeader {
            fragment: fragment.to_string(),
        });
    }

    let name = fields[0];
    if name.is_empty() {
        return Err(DefinitionError::MissingStateName {
            fragment: fragment.to_string(),
        });
    }

    let hook = |index: usize| {
        fields
            .get(index)
            .filter(|field| !field.is_empty())
            .map(|field| field.to_string())
    };

    Ok(StateHeader {
        name: name.to_string(),
        on_enter: hook(1),
        on_leave: hook(2),
    })
}

fn parse_transitions(body: &str, state: &str) -> Result<Vec<TransitionToken>, DefinitionError> {
    body.split(FIELD_SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let pair: Vec<&str> = token.split(PAIR_SEPARATOR).collect();
            match pair.as_slice() {
                [condition, target] if !condition.is_empty() && !target.is_empty() => {
                    Ok(TransitionToken {
                        condition: condition.to_string(),
                        target: target.to_string(),
                    })
                }
                _ => Err(DefinitionError::MalformedTransition {
                    state: state.to_string(),
                    token: token.to_string(),
                }),
            }
        })
        .collect()
}
