//! # statewright-core
//!
//! State machine DSL for statewright.
//!
//! This crate provides:
//! - Definition grammar parsing
//! - Interned transition conditions
//! - Hook binding from explicit host registrations
//! - State graph construction with forward references
//! - The state machine runtime
//!
//! ```rust
//! use statewright_core::{Host, StateMachine};
//!
//! let host = Host::new("station").hook("OnRun", || println!("running"));
//! let mut machine = StateMachine::new(
//!     "(Init) -> {START: Running}; (Running, OnRun) -> {STOP: Init};",
//!     &[host],
//! )
//! .unwrap();
//!
//! assert!(machine.is_in_state("Init"));
//! machine.change_state_by_name("START");
//! assert!(machine.is_in_state("Running"));
//! ```

pub mod binding;
pub mod condition;
pub mod error;
pub mod grammar;
mod graph;
pub mod machine;
pub mod state;

pub use binding::{BoundHook, Hook, HookProvider, Host, MethodBindings};
pub use condition::{Condition, ConditionRegistry, DEFAULT_CONDITION};
pub use error::DefinitionError;
pub use grammar::{StateDecl, StateHeader, TransitionToken};
pub use machine::{
    MachineDescription, StateDescription, StateMachine, StateMachineBuilder, TransitionDescription,
};
pub use state::{State, StateId};
