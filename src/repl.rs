//! Interactive REPL.

use crate::commands::format_machine;
use crate::config::ReplConfig;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use statewright_core::StateMachine;

const HELP_TEXT: &str = r#"
Available commands:
  help                    Show this help

  change <condition>      Follow a declared transition (runs hooks)
  set <state>             Force a transition by state name (runs hooks)
  sync <state>            Force a transition without running hooks
  peek <condition>        Show where a condition would lead

  current                 Show the current state
  is <state>              Check whether the machine is in a state
  conditions              List conditions declared by the current state
  show                    Render all states and transitions

  quit, exit              Exit the REPL
"#;

pub fn run(
    mut machine: StateMachine,
    config: &ReplConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "statewright REPL".bold().cyan());
    println!(
        "Loaded {} states (checksum: {}), current state {}",
        machine.len(),
        machine.checksum(),
        machine.current().name().cyan()
    );

    let editor_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(editor_config)?;

    let history_path = config.history_path();
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", config.prompt.cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut machine, line) {
                    Some(output) => println!("{}\n", output),
                    None => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        tracing::debug!("failed to save history to {}: {}", history_path.display(), e);
    }

    Ok(())
}

/// Executes one REPL line. Returns `None` when the REPL should exit.
fn execute_repl_command(machine: &mut StateMachine, line: &str) -> Option<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Some(String::new());
    }

    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).copied();

    let output = match (cmd.as_str(), arg) {
        ("help" | "?", _) => HELP_TEXT.to_string(),

        ("quit" | "exit" | "q", _) => return None,

        ("change" | "c", Some(condition)) => {
            let from = machine.current().name().to_string();
            match machine.change_state_by_name(condition) {
                Some(state) => format!("{} -> {}", from, state.name().green()),
                None => format!(
                    "{} '{}' is not declared in {}",
                    "Ignored:".yellow(),
                    condition,
                    from
                ),
            }
        }

        ("set" | "s", Some(state)) => force(machine, state, true),

        ("sync", Some(state)) => force(machine, state, false),

        ("peek" | "p", Some(condition)) => match machine.peek_by_name(condition) {
            Some(state) => format!("{} would lead to {}", condition, state.name().cyan()),
            None => format!("{} is not declared in {}", condition, machine.current().name()),
        },

        ("current" | "cur", _) => machine.current().name().cyan().to_string(),

        ("is", Some(state)) => {
            if machine.is_in_state(state) {
                "yes".green().to_string()
            } else {
                "no".red().to_string()
            }
        }

        ("conditions" | "conds", _) => {
            let conditions = machine.available_conditions();
            if conditions.is_empty() {
                "No outgoing transitions".yellow().to_string()
            } else {
                conditions
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        ("show", _) => format_machine(machine),

        ("change" | "c" | "set" | "s" | "sync" | "peek" | "p" | "is", None) => {
            format!("Usage: {} <name>", cmd)
        }

        _ => format!(
            "{}: unknown command '{}'. Type 'help' for available commands.",
            "Error".red(),
            cmd
        ),
    };

    Some(output)
}

fn force(machine: &mut StateMachine, state: &str, invoke: bool) -> String {
    let from = machine.current().name().to_string();
    let moved = if invoke {
        machine.set_state(state)
    } else {
        machine.set_state_no_invoke(state)
    };

    if moved {
        format!("{} -> {}", from, state.green())
    } else {
        format!(
            "{} {} is unknown or already current",
            "Unchanged:".yellow(),
            state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> StateMachine {
        StateMachine::new("(Init) -> {START: Running}; (Running) -> {STOP: Init};", &[]).unwrap()
    }

    #[test]
    fn test_change_and_current() {
        let mut machine = machine();
        execute_repl_command(&mut machine, "change START").unwrap();
        assert!(machine.is_in_state("Running"));

        let output = execute_repl_command(&mut machine, "change START").unwrap();
        assert!(output.contains("not declared"));
        assert!(machine.is_in_state("Running"));
    }

    #[test]
    fn test_set_and_sync() {
        let mut machine = machine();
        execute_repl_command(&mut machine, "sync Running").unwrap();
        assert!(machine.is_in_state("Running"));

        let output = execute_repl_command(&mut machine, "set Running").unwrap();
        assert!(output.contains("already current"));

        execute_repl_command(&mut machine, "set Init").unwrap();
        assert!(machine.is_in_state("Init"));
    }

    #[test]
    fn test_peek_does_not_move() {
        let mut machine = machine();
        let output = execute_repl_command(&mut machine, "peek START").unwrap();
        assert!(output.contains("Running"));
        assert!(machine.is_in_state("Init"));
    }

    #[test]
    fn test_usage_and_quit() {
        let mut machine = machine();
        let output = execute_repl_command(&mut machine, "change").unwrap();
        assert!(output.starts_with("Usage: change"));
        assert!(execute_repl_command(&mut machine, "quit").is_none());
    }
}
