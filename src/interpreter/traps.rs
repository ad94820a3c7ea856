//! Trap table
//!
//! Backs the `trap` builtin and the pseudo-signals bash recognizes in
//! addition to real POSIX signal names: `EXIT` (fires once at script
//! teardown, never on `exec`), `ERR` (fires when a simple command exits
//! non-zero and `errtrace`/`set -E` semantics allow it), `DEBUG` (fires
//! before each simple command) and `RETURN` (fires when a function or
//! sourced script returns). Signal names are stored without their `SIG`
//! prefix, matching how `trap -p` prints them.

use crate::interpreter::types::{InterpreterState, TrapAction};

/// The pseudo-signal names bash recognizes alongside real signals.
pub const PSEUDO_SIGNALS: &[&str] = &["EXIT", "ERR", "DEBUG", "RETURN"];

/// Canonicalize a signal spec as accepted by `trap`: strips a leading
/// `SIG`, upper-cases it, and maps a bare signal number to its name.
/// Returns `None` if the spec isn't recognized.
pub fn normalize_signal_name(spec: &str) -> Option<String> {
    let upper = spec.to_uppercase();
    let stripped = upper.strip_prefix("SIG").unwrap_or(&upper);

    if PSEUDO_SIGNALS.contains(&stripped) {
        return Some(stripped.to_string());
    }

    if let Ok(n) = stripped.parse::<u32>() {
        return signal_name_from_number(n).map(str::to_string);
    }

    signal_number_from_name(stripped).map(|_| stripped.to_string())
}

fn signal_name_from_number(n: u32) -> Option<&'static str> {
    Some(match n {
        0 => "EXIT",
        1 => "HUP",
        2 => "INT",
        3 => "QUIT",
        4 => "ILL",
        6 => "ABRT",
        8 => "FPE",
        9 => "KILL",
        10 => "USR1",
        11 => "SEGV",
        12 => "USR2",
        13 => "PIPE",
        14 => "ALRM",
        15 => "TERM",
        17 => "CHLD",
        18 => "CONT",
        19 => "STOP",
        20 => "TSTP",
        21 => "TTIN",
        22 => "TTOU",
        _ => return None,
    })
}

/// Signal number for a canonical (no-SIG-prefix) signal name, used by
/// `kill -l` and to validate names passed to `trap`.
pub fn signal_number_from_name(name: &str) -> Option<u32> {
    Some(match name {
        "EXIT" => 0,
        "HUP" => 1,
        "INT" => 2,
        "QUIT" => 3,
        "ILL" => 4,
        "ABRT" => 6,
        "FPE" => 8,
        "KILL" => 9,
        "USR1" => 10,
        "SEGV" => 11,
        "USR2" => 12,
        "PIPE" => 13,
        "ALRM" => 14,
        "TERM" => 15,
        "CHLD" => 17,
        "CONT" => 18,
        "STOP" => 19,
        "TSTP" => 20,
        "TTIN" => 21,
        "TTOU" => 22,
        _ => return None,
    })
}

/// Register a trap action for a signal, replacing any existing one.
pub fn set_trap(state: &mut InterpreterState, signal: &str, action: TrapAction) -> Result<(), String> {
    let name = normalize_signal_name(signal).ok_or_else(|| format!("{}: invalid signal specification", signal))?;
    state.traps.insert(name, action);
    Ok(())
}

/// Remove a trap, reverting the signal to its default disposition.
pub fn unset_trap(state: &mut InterpreterState, signal: &str) -> Result<(), String> {
    let name = normalize_signal_name(signal).ok_or_else(|| format!("{}: invalid signal specification", signal))?;
    state.traps.remove(&name);
    Ok(())
}

pub fn get_trap<'a>(state: &'a InterpreterState, signal: &str) -> Option<&'a TrapAction> {
    let name = normalize_signal_name(signal)?;
    state.traps.get(&name)
}

/// All registered traps, formatted the way `trap -p` prints them:
/// `trap -- 'command' SIGNAL` or `trap -- '' SIGNAL` for an ignored signal.
pub fn list_traps(state: &InterpreterState) -> Vec<String> {
    let mut names: Vec<&String> = state.traps.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| {
            let body = match &state.traps[name] {
                TrapAction::Command(cmd) => cmd.clone(),
                TrapAction::Ignore => String::new(),
            };
            format!("trap -- '{}' {}", body.replace('\'', "'\\''"), name)
        })
        .collect()
}

/// Whether a command for `signal` is registered and not `ignore`.
pub fn has_runnable_trap(state: &InterpreterState, signal: &str) -> bool {
    matches!(get_trap(state, signal), Some(TrapAction::Command(_)))
}

/// Run the EXIT trap exactly once. Bash fires it on normal fall-off-the-end
/// termination and on an explicit `exit`, but never a second time if the
/// trap's own body calls `exit`, and never at all if the script was
/// replaced via `exec`. Callers should check `state.exit_trap_fired` isn't
/// already set before calling, and pass the command to `run`.
pub fn take_exit_trap_command(state: &mut InterpreterState) -> Option<String> {
    if state.exit_trap_fired {
        return None;
    }
    state.exit_trap_fired = true;
    match state.traps.get("EXIT") {
        Some(TrapAction::Command(cmd)) => Some(cmd.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::InterpreterState;

    #[test]
    fn normalizes_sig_prefix_and_case() {
        assert_eq!(normalize_signal_name("sigint").as_deref(), Some("INT"));
        assert_eq!(normalize_signal_name("TERM").as_deref(), Some("TERM"));
        assert_eq!(normalize_signal_name("0").as_deref(), Some("EXIT"));
        assert_eq!(normalize_signal_name("exit").as_deref(), Some("EXIT"));
        assert_eq!(normalize_signal_name("bogus"), None);
    }

    #[test]
    fn set_get_unset_round_trip() {
        let mut state = InterpreterState::default();
        set_trap(&mut state, "INT", TrapAction::Command("echo hi".into())).unwrap();
        assert!(has_runnable_trap(&state, "SIGINT"));
        unset_trap(&mut state, "int").unwrap();
        assert!(get_trap(&state, "INT").is_none());
    }

    #[test]
    fn exit_trap_fires_exactly_once() {
        let mut state = InterpreterState::default();
        set_trap(&mut state, "EXIT", TrapAction::Command("cleanup".into())).unwrap();
        assert_eq!(take_exit_trap_command(&mut state).as_deref(), Some("cleanup"));
        assert_eq!(take_exit_trap_command(&mut state), None);
    }
}
