//! trap - Register and list signal/pseudo-signal handlers
//!
//! `trap [-lp] [COMMAND SIGSPEC...]` following bash's three forms:
//! `trap` / `trap -p` lists registered traps, `trap -l` lists signal
//! names and numbers, and `trap COMMAND SIGSPEC...` registers `COMMAND`
//! for each named signal (`trap '' SIGSPEC...` ignores it, `trap -
//! SIGSPEC...` resets it to the default disposition).

use super::break_cmd::BuiltinResult;
use crate::interpreter::traps::{list_traps, set_trap, signal_number_from_name, unset_trap};
use crate::interpreter::types::{InterpreterState, TrapAction};

const SIGNAL_NAMES: &[&str] = &[
    "HUP", "INT", "QUIT", "ILL", "ABRT", "FPE", "KILL", "USR1", "SEGV", "USR2", "PIPE", "ALRM",
    "TERM", "CHLD", "CONT", "STOP", "TSTP", "TTIN", "TTOU",
];

pub fn handle_trap(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.first().map(|a| a.as_str()) == Some("-l") {
        let mut stdout = String::new();
        for name in SIGNAL_NAMES {
            if let Some(n) = signal_number_from_name(name) {
                stdout.push_str(&format!("{}) SIG{}\n", n, name));
            }
        }
        return BuiltinResult {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        };
    }

    if args.is_empty() || args.first().map(|a| a.as_str()) == Some("-p") {
        let specs = &args.get(1..).unwrap_or(&[]);
        let names: Vec<String> = if specs.is_empty() {
            list_traps(state)
        } else {
            specs
                .iter()
                .filter_map(|spec| {
                    crate::interpreter::traps::get_trap(state, spec).map(|action| {
                        let body = match action {
                            TrapAction::Command(cmd) => cmd.clone(),
                            TrapAction::Ignore => String::new(),
                        };
                        format!("trap -- '{}' {}", body.replace('\'', "'\\''"), spec.to_uppercase())
                    })
                })
                .collect()
        };
        let mut stdout = names.join("\n");
        if !stdout.is_empty() {
            stdout.push('\n');
        }
        return BuiltinResult {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        };
    }

    let (action_arg, signals) = (&args[0], &args[1..]);
    if signals.is_empty() {
        return BuiltinResult::failure("bash: trap: usage: trap [-lp] [[arg] signal_spec ...]\n", 2);
    }

    let action = if action_arg == "-" {
        None
    } else if action_arg.is_empty() {
        Some(TrapAction::Ignore)
    } else {
        Some(TrapAction::Command(action_arg.clone()))
    };

    let mut stderr = String::new();
    for signal in signals {
        let result = match &action {
            None => unset_trap(state, signal),
            Some(act) => set_trap(state, signal, act.clone()),
        };
        if let Err(msg) = result {
            stderr.push_str(&format!("bash: trap: {}\n", msg));
        }
    }

    BuiltinResult {
        stdout: String::new(),
        exit_code: if stderr.is_empty() { 0 } else { 1 },
        stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_command_for_exit() {
        let mut state = InterpreterState::default();
        let result = handle_trap(&mut state, &["echo bye".to_string(), "EXIT".to_string()]);
        assert_eq!(result.exit_code, 0);
        assert!(matches!(state.traps.get("EXIT"), Some(TrapAction::Command(c)) if c == "echo bye"));
    }

    #[test]
    fn dash_resets_to_default() {
        let mut state = InterpreterState::default();
        state.traps.insert("INT".to_string(), TrapAction::Command("echo x".to_string()));
        handle_trap(&mut state, &["-".to_string(), "INT".to_string()]);
        assert!(state.traps.get("INT").is_none());
    }

    #[test]
    fn empty_body_ignores_signal() {
        let mut state = InterpreterState::default();
        handle_trap(&mut state, &[String::new(), "TERM".to_string()]);
        assert!(matches!(state.traps.get("TERM"), Some(TrapAction::Ignore)));
    }

    #[test]
    fn dash_p_lists_registered_traps() {
        let mut state = InterpreterState::default();
        handle_trap(&mut state, &["echo hi".to_string(), "EXIT".to_string()]);
        let result = handle_trap(&mut state, &["-p".to_string()]);
        assert!(result.stdout.contains("trap -- 'echo hi' EXIT"));
    }

    #[test]
    fn unknown_signal_reports_error() {
        let mut state = InterpreterState::default();
        let result = handle_trap(&mut state, &["echo x".to_string(), "BOGUS".to_string()]);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("invalid signal"));
    }

    #[test]
    fn dash_l_lists_signal_numbers() {
        let mut state = InterpreterState::default();
        let result = handle_trap(&mut state, &["-l".to_string()]);
        assert!(result.stdout.contains("SIGINT"));
    }
}
