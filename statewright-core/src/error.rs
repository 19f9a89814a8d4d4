//! Definition error types.

use thiserror::Error;

/// Errors raised while compiling a definition into a state machine.
///
/// Every variant is detected at construction time. A machine that was built
/// successfully never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("no valid state found in definition")]
    NoStates,

    #[error("malformed state definition '{fragment}': expected exactly one '->'")]
    MalformedStateDefinition { fragment: String },

    #[error("no state name in state definition '{fragment}'")]
    MissingStateName { fragment: String },

    #[error("malformed state header '{fragment}': expected name[,onEnter[,onLeave]]")]
    MalformedHeader { fragment: String },

    #[error("malformed transition '{token}' in state '{state}': expected condition:target")]
    MalformedTransition { state: String, token: String },

    #[error("no available method '{method}' for state '{state}'")]
    MissingMethod { state: String, method: String },

    #[error("duplicate method binding '{method}' (hosts '{first_host}' and '{second_host}')")]
    DuplicateBinding {
        method: String,
        first_host: String,
        second_host: String,
    },

    #[error("duplicate state '{state}'")]
    DuplicateState { state: String },

    #[error("duplicate condition '{condition}' in state definition '{state}'")]
    DuplicateCondition { state: String, condition: String },

    #[error("target state '{target}' does not exist (state '{state}', condition '{condition}')")]
    UnknownTarget {
        state: String,
        condition: String,
        target: String,
    },
}

impl DefinitionError {
    /// Returns a stable code suitable for logs and machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            DefinitionError::NoStates => "NO_STATES",
            DefinitionError::MalformedStateDefinition { .. } => "MALFORMED_STATE",
            DefinitionError::MissingStateName { .. } => "MISSING_STATE_NAME",
            DefinitionError::MalformedHeader { .. } => "MALFORMED_HEADER",
            DefinitionError::MalformedTransition { .. } => "MALFORMED_TRANSITION",
            DefinitionError::MissingMethod { .. } => "MISSING_METHOD",
            DefinitionError::DuplicateBinding { .. } => "DUPLICATE_BINDING",
            DefinitionError::DuplicateState { .. } => "DUPLICATE_STATE",
            DefinitionError::DuplicateCondition { .. } => "DUPLICATE_CONDITION",
            DefinitionError::UnknownTarget { .. } => "UNKNOWN_TARGET",
        }
    }

    /// Returns whether the error comes from the grammar rather than from
    /// cross-referencing states, conditions, and hooks.
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            DefinitionError::NoStates
                | DefinitionError::MalformedStateDefinition { .. }
                | DefinitionError::MissingStateName { .. }
                | DefinitionError::MalformedHeader { .. }
                | DefinitionError::MalformedTransition { .. }
        )
    }
}
