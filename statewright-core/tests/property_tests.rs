//! Property-based tests for definition compilation and the runtime.
//!
//! Definitions are generated as ring-shaped graphs with random extra edges so
//! they are always valid; conditions are drawn from a small alphabet that
//! includes names no state declares.

use parking_lot::Mutex;
use proptest::prelude::*;
use statewright_core::{Condition, ConditionRegistry, Host, StateMachine};
use std::sync::Arc;

const CONDITIONS: [&str; 5] = ["GO", "BACK", "JUMP", "RESET", "NEVER"];

#[derive(Debug, Clone)]
struct GeneratedDefinition {
    text: String,
    state_count: usize,
}

prop_compose! {
    fn arbitrary_definition()(
        state_count in 1usize..8,
        extra in proptest::collection::vec((0usize..8, 1usize..4, 0usize..8), 0..12),
        trailing in any::<bool>(),
    ) -> GeneratedDefinition {
        let mut fragments = Vec::new();
        for i in 0..state_count {
            // Every state gets GO to the next one; extra edges use other
            // conditions and are deduplicated per state.
            let mut transitions = vec![format!("GO: S{}", (i + 1) % state_count)];
            let mut used = vec![0usize];
            for (from, cond, to) in &extra {
                if from % state_count == i && !used.contains(cond) {
                    used.push(*cond);
                    transitions.push(format!("{}: S{}", CONDITIONS[*cond], to % state_count));
                }
            }
            fragments.push(format!(
                "(S{i}, Enter{i}, Leave{i}) -> {{ {} }}",
                transitions.join(", ")
            ));
        }
        let mut text = fragments.join(";\n");
        if trailing {
            text.push(';');
        }
        GeneratedDefinition { text, state_count }
    }
}

fn recording_host(state_count: usize) -> (Host, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut host = Host::new("recorder");
    for i in 0..state_count {
        for name in [format!("Enter{i}"), format!("Leave{i}")] {
            let log = log.clone();
            let entry = name.clone();
            host = host.hook(name, move || log.lock().push(entry.clone()));
        }
    }
    (host, log)
}

fn build(def: &GeneratedDefinition) -> (StateMachine, Arc<Mutex<Vec<String>>>) {
    let (host, log) = recording_host(def.state_count);
    let machine = StateMachine::builder(def.text.as_str())
        .host(host)
        .registry(Arc::new(ConditionRegistry::new()))
        .build()
        .unwrap();
    (machine, log)
}

proptest! {
    #[test]
    fn state_count_matches_fragments(def in arbitrary_definition()) {
        let (machine, log) = build(&def);
        prop_assert_eq!(machine.len(), def.state_count);
        prop_assert_eq!(machine.states().count(), def.state_count);
        prop_assert!(machine.is_in_state("S0"));
        prop_assert_eq!(log.lock().clone(), vec!["Enter0".to_string()]);
    }

    #[test]
    fn condition_sequences_are_deterministic(
        def in arbitrary_definition(),
        steps in proptest::collection::vec(0usize..CONDITIONS.len(), 0..32),
    ) {
        let (mut first, first_log) = build(&def);
        let (mut second, second_log) = build(&def);

        for step in &steps {
            first.change_state_by_name(CONDITIONS[*step]);
            second.change_state_by_name(CONDITIONS[*step]);
        }

        prop_assert_eq!(first.current().name(), second.current().name());
        prop_assert_eq!(first_log.lock().clone(), second_log.lock().clone());
    }

    #[test]
    fn undeclared_conditions_change_nothing(
        def in arbitrary_definition(),
        steps in proptest::collection::vec(0usize..CONDITIONS.len(), 0..16),
    ) {
        let (mut machine, log) = build(&def);
        for step in &steps {
            machine.change_state_by_name(CONDITIONS[*step]);
        }

        let current = machine.current().name().to_string();
        let calls = log.lock().len();

        prop_assert!(machine.change_state_by_name("NEVER").is_none());
        prop_assert!(machine.change_state_by_name("NOT_IN_ALPHABET").is_none());
        prop_assert_eq!(machine.current().name(), current.as_str());
        prop_assert_eq!(log.lock().len(), calls);
    }

    #[test]
    fn set_state_to_current_is_rejected(def in arbitrary_definition(), target in 0usize..8) {
        let (mut machine, log) = build(&def);
        let name = format!("S{}", target % def.state_count);
        machine.set_state_no_invoke(&name);

        let calls = log.lock().len();
        prop_assert!(!machine.set_state(&name));
        prop_assert!(!machine.set_state("Unknown"));
        prop_assert_eq!(log.lock().len(), calls);
    }

    #[test]
    fn interning_returns_identical_values(name in "[A-Z_]{1,12}") {
        let registry = ConditionRegistry::new();
        let a = registry.get_or_create(&name);
        let b = registry.get_or_create(&name);
        prop_assert_eq!(&a, &b);
        prop_assert!(Condition::ptr_eq(&a, &b));
    }
}
