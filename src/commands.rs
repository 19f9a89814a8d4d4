//! Command execution.

use crate::config::HooksConfig;
use crate::Commands;
use colored::Colorize;
use statewright_core::{grammar, Host, StateMachine};

/// Reads a definition argument; `@path` reads the definition from a file.
pub fn load_definition(arg: &str) -> Result<String, Box<dyn std::error::Error>> {
    match arg.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(arg.to_string()),
    }
}

/// Collects the hook names to bind for `definition`, without duplicates.
pub fn hook_names(
    definition: &str,
    hooks: &HooksConfig,
    extra: &[String],
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    for name in hooks.names.iter().chain(extra) {
        push(name.as_str());
    }

    if hooks.auto_bind {
        let decls = grammar::parse(definition)?;
        for name in grammar::hook_names(&decls) {
            push(name);
        }
    }

    Ok(names)
}

/// Builds a host whose hooks print and log their own name.
pub fn echo_host(names: &[String]) -> Host {
    names.iter().fold(Host::new("cli"), |host, name| {
        let label = name.clone();
        host.hook(name.clone(), move || {
            tracing::info!("hook {} invoked", label);
            eprintln!("  {} {}", "hook".dimmed(), label.magenta());
        })
    })
}

/// Compiles `definition` with echo hooks for `names`.
pub fn build_machine(
    definition: &str,
    names: &[String],
) -> Result<StateMachine, Box<dyn std::error::Error>> {
    let machine = StateMachine::new(definition, &[echo_host(names)]).map_err(|e| {
        tracing::error!("definition rejected ({}): {}", e.error_code(), e);
        e
    })?;
    Ok(machine)
}

/// Executes a one-shot command and returns the formatted output.
pub fn execute(
    cmd: Commands,
    hooks: &HooksConfig,
    extra_hooks: &[String],
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { .. } => unreachable!(),

        Commands::Check { definition, json } => {
            let definition = load_definition(&definition)?;
            let names = hook_names(&definition, hooks, extra_hooks)?;
            let machine = build_machine(&definition, &names)?;

            if json {
                return Ok(serde_json::to_string_pretty(&machine.describe())?);
            }

            Ok(format!(
                "{} {} states, initial {} (checksum: {})\n{}",
                "Valid".green(),
                machine.len(),
                machine.initial().name().cyan(),
                machine.checksum(),
                format_machine(&machine)
            ))
        }

        Commands::Run {
            definition,
            steps,
            force,
        } => {
            let definition = load_definition(&definition)?;
            let names = hook_names(&definition, hooks, extra_hooks)?;
            let mut machine = build_machine(&definition, &names)?;
            println!("{} {}", "start".dimmed(), machine.current().name().cyan());

            for step in &steps {
                println!("{}", run_step(&mut machine, step, force));
            }

            Ok(format!(
                "{} {}",
                "Final state:".bold(),
                machine.current().name().cyan()
            ))
        }
    }
}

/// Applies one step: a condition, or a state name when `force` is set.
pub fn run_step(machine: &mut StateMachine, step: &str, force: bool) -> String {
    let from = machine.current().name().to_string();

    if force {
        return if machine.set_state(step) {
            format!("{} {} -> {}", "set".green(), from, step.cyan())
        } else {
            format!(
                "{} {} (unknown or already current)",
                "unchanged".yellow(),
                step
            )
        };
    }

    match machine.change_state_by_name(step) {
        Some(state) => format!(
            "{} {} --{}--> {}",
            "moved".green(),
            from,
            step,
            state.name().cyan()
        ),
        None => format!(
            "{} '{}' not declared in {}",
            "ignored".yellow(),
            step,
            from
        ),
    }
}

/// Renders states and transitions, marking the current state.
pub fn format_machine(machine: &StateMachine) -> String {
    let mut output = String::new();
    for state in machine.states() {
        let marker = if machine.is_in(state) { "*" } else { " " };
        let mut hooks = Vec::new();
        if let Some(enter) = state.on_enter() {
            hooks.push(format!("enter={}", enter));
        }
        if let Some(leave) = state.on_leave() {
            hooks.push(format!("leave={}", leave));
        }

        output.push_str(&format!("{} {}", marker, state.name().bold()));
        if !hooks.is_empty() {
            output.push_str(&format!(" {}", format!("[{}]", hooks.join(", ")).dimmed()));
        }
        output.push('\n');

        for (condition, target) in state.transitions() {
            let target = machine
                .state_by_id(target)
                .map(|s| s.name())
                .unwrap_or("?");
            output.push_str(&format!("    {} -> {}\n", condition.to_string().yellow(), target));
        }
    }
    output
}
