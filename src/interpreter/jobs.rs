//! Background job table
//!
//! `just-bash` has no real OS process fork, so a background job (`cmd &`)
//! cannot run concurrently with the script that spawned it. Job control is
//! modeled faithfully around that constraint: starting a job runs the
//! command to completion immediately against a virtual PID, but its output
//! is captured into the job record instead of the controlling statement's
//! stdout/stderr, and `$!`/`jobs`/`wait` observe it exactly as they would a
//! real asynchronously-completing job. See DESIGN.md for the full rationale.

use std::collections::HashMap;

/// Lifecycle state of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    Done,
}

/// A single background job record.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_number: u32,
    pub pid: u32,
    pub command_string: String,
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Set when the job has been `disown`ed: it no longer appears in `jobs`
    /// and is not waited on by a bare `wait`.
    pub disowned: bool,
}

impl Job {
    pub fn new(job_number: u32, pid: u32, command_string: String) -> Self {
        Self {
            job_number,
            pid,
            command_string,
            status: JobStatus::Running,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            disowned: false,
        }
    }

    /// The `128+N` exit code bash reports for a job killed by signal N.
    pub fn killed_by_signal(signum: i32) -> i32 {
        128 + signum
    }
}

/// Resolve a job spec (`%1`, `%+`, `%-`, `%%`, `%foo`, or a bare job number)
/// against the job table, bash-style.
pub fn resolve_job_spec(
    jobs: &HashMap<u32, Job>,
    current_job: Option<u32>,
    previous_job: Option<u32>,
    spec: &str,
) -> Option<u32> {
    let spec = spec.strip_prefix('%').unwrap_or(spec);
    match spec {
        "" | "%" | "+" => current_job.filter(|n| jobs.contains_key(n)),
        "-" => previous_job.filter(|n| jobs.contains_key(n)),
        _ => {
            if let Ok(n) = spec.parse::<u32>() {
                return jobs.contains_key(&n).then_some(n);
            }
            // %foo matches a job whose command starts with "foo"
            jobs.values()
                .find(|j| j.command_string.starts_with(spec))
                .map(|j| j.job_number)
        }
    }
}

/// Format a single `jobs` listing line, bash-style:
/// `[1]+  Running                 sleep 10 &`
pub fn format_job_line(job: &Job, is_current: bool, is_previous: bool) -> String {
    let marker = if is_current {
        "+"
    } else if is_previous {
        "-"
    } else {
        " "
    };
    let status = match job.status {
        JobStatus::Running => "Running",
        JobStatus::Stopped => "Stopped",
        JobStatus::Done => {
            if job.exit_code.unwrap_or(0) == 0 {
                "Done"
            } else {
                "Exit"
            }
        }
    };
    match job.status {
        JobStatus::Done if job.exit_code.unwrap_or(0) != 0 => format!(
            "[{}]{}  {} {}                {} &",
            job.job_number,
            marker,
            status,
            job.exit_code.unwrap_or(0),
            job.command_string
        ),
        _ => format!(
            "[{}]{}  {}                 {} &",
            job.job_number, marker, status, job.command_string
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(u32, &str)]) -> HashMap<u32, Job> {
        entries
            .iter()
            .map(|(n, cmd)| (*n, Job::new(*n, 1000 + n, cmd.to_string())))
            .collect()
    }

    #[test]
    fn resolve_current_and_previous() {
        let jobs = table(&[(1, "sleep 1"), (2, "sleep 2")]);
        assert_eq!(resolve_job_spec(&jobs, Some(2), Some(1), "%%"), Some(2));
        assert_eq!(resolve_job_spec(&jobs, Some(2), Some(1), "%-"), Some(1));
    }

    #[test]
    fn resolve_numbered_and_by_name() {
        let jobs = table(&[(1, "sleep 1"), (2, "make build")]);
        assert_eq!(resolve_job_spec(&jobs, None, None, "%2"), Some(2));
        assert_eq!(resolve_job_spec(&jobs, None, None, "%make"), Some(2));
        assert_eq!(resolve_job_spec(&jobs, None, None, "%nope"), None);
    }

    #[test]
    fn killed_by_signal_exit_code() {
        assert_eq!(Job::killed_by_signal(9), 137);
    }
}
