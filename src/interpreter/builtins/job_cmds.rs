//! jobs, wait, fg, bg, disown, kill, suspend - job control builtins
//!
//! `just-bash` models background jobs without a real OS fork (see
//! `interpreter::jobs`): a job finishes the moment it is started, with its
//! output captured into the job record instead of the terminal. These
//! builtins all operate against that already-completed job table rather
//! than against live processes.

use super::break_cmd::BuiltinResult;
use crate::interpreter::jobs::{format_job_line, resolve_job_spec, Job, JobStatus};
use crate::interpreter::types::InterpreterState;

/// List background jobs, bash `jobs`-style. `-l` is accepted but PIDs are
/// always shown; `-p` prints PIDs only.
pub fn handle_jobs(state: &InterpreterState, args: &[String]) -> BuiltinResult {
    let mut pids_only = false;
    let mut specs: Vec<&str> = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-l" | "-n" => {}
            "-p" => pids_only = true,
            _ => specs.push(arg),
        }
    }

    let mut numbers: Vec<u32> = if specs.is_empty() {
        state
            .jobs
            .values()
            .filter(|j| !j.disowned)
            .map(|j| j.job_number)
            .collect()
    } else {
        specs
            .iter()
            .filter_map(|s| resolve_job_spec(&state.jobs, state.current_job, state.previous_job, s))
            .collect()
    };
    numbers.sort_unstable();

    let mut stdout = String::new();
    for n in numbers {
        if let Some(job) = state.jobs.get(&n) {
            if pids_only {
                stdout.push_str(&format!("{}\n", job.pid));
            } else {
                let is_current = state.current_job == Some(n);
                let is_previous = state.previous_job == Some(n);
                stdout.push_str(&format_job_line(job, is_current, is_previous));
                stdout.push('\n');
            }
        }
    }
    BuiltinResult {
        stdout,
        stderr: String::new(),
        exit_code: 0,
    }
}

/// `wait [job_spec_or_pid ...]`. Every job in this shell's table is already
/// finished by the time it's inserted, so this resolves specs against the
/// table and reports their recorded exit codes rather than blocking.
pub fn handle_wait(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.is_empty() {
        // No operands: bash waits for every job, exiting 0 once the last
        // has been reaped. All our jobs are already done.
        let numbers: Vec<u32> = state.jobs.keys().copied().collect();
        for n in numbers {
            state.jobs.remove(&n);
        }
        return BuiltinResult::ok();
    }

    let mut stderr = String::new();
    let mut exit_code = 0;
    for spec in args {
        let resolved = spec
            .strip_prefix('%')
            .map(|_| resolve_job_spec(&state.jobs, state.current_job, state.previous_job, spec))
            .unwrap_or_else(|| {
                let pid: Option<u32> = spec.parse().ok();
                pid.and_then(|p| state.jobs.values().find(|j| j.pid == p).map(|j| j.job_number))
            });

        match resolved.and_then(|n| state.jobs.get(&n).cloned()) {
            Some(job) => {
                exit_code = job.exit_code.unwrap_or(0);
                state.jobs.remove(&job.job_number);
            }
            None => {
                stderr.push_str(&format!("bash: wait: {}: no such job\n", spec));
                exit_code = 127;
            }
        }
    }

    BuiltinResult {
        stdout: String::new(),
        stderr,
        exit_code,
    }
}

/// `fg [job_spec]`. Brings a job to the foreground: prints its command
/// line, replays its captured output as if it had just completed, and
/// reaps it from the table.
pub fn handle_fg(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let spec = args.first().map(|s| s.as_str()).unwrap_or("%%");
    let Some(n) = resolve_job_spec(&state.jobs, state.current_job, state.previous_job, spec) else {
        return BuiltinResult::failure("bash: fg: no such job\n", 1);
    };
    let job = state.jobs.remove(&n).expect("resolved job must be present");
    if state.current_job == Some(n) {
        state.current_job = state.previous_job;
        state.previous_job = None;
    }

    let mut stdout = format!("{}\n", job.command_string);
    stdout.push_str(&job.stdout);
    BuiltinResult {
        stdout,
        stderr: job.stderr,
        exit_code: job.exit_code.unwrap_or(0),
    }
}

/// `bg [job_spec]`. Since jobs never actually stop, `bg` just reports that
/// the job is (still) running in the background.
pub fn handle_bg(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let spec = args.first().map(|s| s.as_str()).unwrap_or("%%");
    let Some(n) = resolve_job_spec(&state.jobs, state.current_job, state.previous_job, spec) else {
        return BuiltinResult::failure("bash: bg: no such job\n", 1);
    };
    let job = state.jobs.get(&n).expect("resolved job must be present");
    BuiltinResult {
        stdout: format!("[{}]+ {} &\n", n, job.command_string),
        stderr: String::new(),
        exit_code: 0,
    }
}

/// `disown [-a] [-r] [job_spec ...]`. Marks jobs so they're no longer
/// listed by `jobs` or waited on by a bare `wait`.
pub fn handle_disown(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    let mut all = false;
    let mut specs: Vec<&str> = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-a" | "-r" => all = true,
            _ => specs.push(arg),
        }
    }

    if specs.is_empty() {
        if all || args.is_empty() {
            for job in state.jobs.values_mut() {
                job.disowned = true;
            }
            return BuiltinResult::ok();
        }
    }

    let mut stderr = String::new();
    for spec in &specs {
        match resolve_job_spec(&state.jobs, state.current_job, state.previous_job, spec) {
            Some(n) => {
                if let Some(job) = state.jobs.get_mut(&n) {
                    job.disowned = true;
                }
            }
            None => stderr.push_str(&format!("bash: disown: {}: no such job\n", spec)),
        }
    }

    BuiltinResult {
        stdout: String::new(),
        stderr: stderr.clone(),
        exit_code: if stderr.is_empty() { 0 } else { 1 },
    }
}

/// `kill [-s sig | -sig] pid|%job ...` and `kill -l`. Since jobs complete
/// synchronously, "killing" one just marks it done with the signal's exit
/// code; killing a bare virtual PID that isn't tracked as a job is
/// reported as "no such process".
pub fn handle_kill(state: &mut InterpreterState, args: &[String]) -> BuiltinResult {
    if args.first().map(|a| a.as_str()) == Some("-l") {
        return BuiltinResult {
            stdout: "SIGHUP\nSIGINT\nSIGQUIT\nSIGKILL\nSIGTERM\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
        };
    }

    let mut signal = 15i32;
    let mut targets: Vec<&str> = Vec::new();
    for arg in args {
        if let Some(rest) = arg.strip_prefix("-s") {
            signal = parse_signal(rest.trim_start());
        } else if let Some(rest) = arg.strip_prefix('-') {
            if let Ok(n) = rest.parse::<i32>() {
                signal = n;
            } else {
                signal = parse_signal(rest);
            }
        } else {
            targets.push(arg);
        }
    }

    let mut stderr = String::new();
    for target in targets {
        let job_number = if let Some(spec) = target.strip_prefix('%') {
            resolve_job_spec(&state.jobs, state.current_job, state.previous_job, &format!("%{}", spec))
        } else {
            target
                .parse::<u32>()
                .ok()
                .and_then(|pid| state.jobs.values().find(|j| j.pid == pid).map(|j| j.job_number))
        };

        match job_number.and_then(|n| state.jobs.get_mut(&n)) {
            Some(job) => {
                job.status = JobStatus::Done;
                job.exit_code = Some(Job::killed_by_signal(signal));
            }
            None => stderr.push_str(&format!("bash: kill: ({}) - No such process\n", target)),
        }
    }

    BuiltinResult {
        stdout: String::new(),
        stderr: stderr.clone(),
        exit_code: if stderr.is_empty() { 0 } else { 1 },
    }
}

fn parse_signal(name: &str) -> i32 {
    match name.trim_start_matches("SIG") {
        "HUP" => 1,
        "INT" => 2,
        "QUIT" => 3,
        "KILL" => 9,
        "TERM" => 15,
        "USR1" => 10,
        "USR2" => 12,
        other => other.parse().unwrap_or(15),
    }
}

/// `suspend`. There is no interactive job-control terminal to stop, so this
/// is a documented no-op that always succeeds, matching `suspend`'s
/// behavior in a shell that isn't a session leader.
pub fn handle_suspend(_state: &InterpreterState, _args: &[String]) -> BuiltinResult {
    BuiltinResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(n: u32, pid: u32, cmd: &str, exit_code: i32) -> Job {
        let mut j = Job::new(n, pid, cmd.to_string());
        j.status = JobStatus::Done;
        j.exit_code = Some(exit_code);
        j
    }

    #[test]
    fn jobs_lists_current_marker() {
        let mut state = InterpreterState::default();
        state.jobs.insert(1, job(1, 1001, "sleep 1", 0));
        state.current_job = Some(1);
        let result = handle_jobs(&state, &[]);
        assert!(result.stdout.contains("[1]+"));
        assert!(result.stdout.contains("sleep 1"));
    }

    #[test]
    fn wait_reaps_resolved_job_and_reports_exit_code() {
        let mut state = InterpreterState::default();
        state.jobs.insert(1, job(1, 1001, "false", 1));
        let result = handle_wait(&mut state, &["%1".to_string()]);
        assert_eq!(result.exit_code, 1);
        assert!(!state.jobs.contains_key(&1));
    }

    #[test]
    fn wait_unknown_job_reports_127() {
        let mut state = InterpreterState::default();
        let result = handle_wait(&mut state, &["%5".to_string()]);
        assert_eq!(result.exit_code, 127);
    }

    #[test]
    fn fg_replays_captured_output_and_reaps() {
        let mut state = InterpreterState::default();
        let mut j = job(1, 1001, "echo hi", 0);
        j.stdout = "hi\n".to_string();
        state.jobs.insert(1, j);
        state.current_job = Some(1);
        let result = handle_fg(&mut state, &[]);
        assert!(result.stdout.contains("hi"));
        assert_eq!(result.exit_code, 0);
        assert!(!state.jobs.contains_key(&1));
    }

    #[test]
    fn disown_marks_job_hidden_from_jobs() {
        let mut state = InterpreterState::default();
        state.jobs.insert(1, job(1, 1001, "sleep 1", 0));
        handle_disown(&mut state, &["%1".to_string()]);
        assert!(state.jobs.get(&1).unwrap().disowned);
        let listing = handle_jobs(&state, &[]);
        assert!(listing.stdout.is_empty());
    }

    #[test]
    fn kill_marks_job_done_with_signal_exit_code() {
        let mut state = InterpreterState::default();
        state.jobs.insert(1, job(1, 1001, "sleep 100", 0));
        let result = handle_kill(&mut state, &["-9".to_string(), "%1".to_string()]);
        assert_eq!(result.exit_code, 0);
        assert_eq!(state.jobs.get(&1).unwrap().exit_code, Some(137));
    }

    #[test]
    fn kill_unknown_target_reports_error() {
        let mut state = InterpreterState::default();
        let result = handle_kill(&mut state, &["99999".to_string()]);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("No such process"));
    }
}
