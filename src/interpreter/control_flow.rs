//! Control Flow Execution
//!
//! Handles control flow constructs:
//! - if/elif/else
//! - for loops
//! - C-style for loops
//! - while loops
//! - until loops
//! - case statements
//! - break/continue

use regex_lite::Regex;

use crate::ast::types::StatementNode;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::types::{ExecResult, InterpreterState};

/// Result of executing a loop or if/elif/else chain.
#[derive(Debug, Clone, Default)]
pub struct ForResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ForResult {
    fn append(&mut self, stdout: &str, stderr: &str, exit_code: i32) {
        self.stdout.push_str(stdout);
        self.stderr.push_str(stderr);
        self.exit_code = exit_code;
    }
}

/// Run a condition's statement list, returning the exit code of the last one.
fn run_condition_list<F>(
    state: &mut InterpreterState,
    stmts: &[&StatementNode],
    result: &mut ForResult,
    eval_condition: &mut F,
) -> Result<i32, InterpreterError>
where
    F: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
{
    let mut code = 0;
    for stmt in stmts {
        let r = eval_condition(state, stmt)?;
        result.append(&r.stdout, &r.stderr, r.exit_code);
        code = r.exit_code;
    }
    Ok(code)
}

/// Run a body's statement list, handling break/continue by propagating them
/// to the caller (the loop itself decides whether to absorb them).
fn run_body<G>(
    state: &mut InterpreterState,
    stmts: &[&StatementNode],
    result: &mut ForResult,
    exec_stmt: &mut G,
) -> Result<(), InterpreterError>
where
    G: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    for stmt in stmts {
        let r = exec_stmt(state, stmt)?;
        result.append(&r.stdout, &r.stderr, r.exit_code);
    }
    Ok(())
}

/// Execute an if/elif/.../else chain.
pub fn execute_if<F, G>(
    state: &mut InterpreterState,
    clauses: &[(Vec<&StatementNode>, Vec<&StatementNode>)],
    else_body: Option<&[&StatementNode]>,
    mut eval_condition: F,
    mut exec_stmt: G,
) -> Result<ForResult, InterpreterError>
where
    F: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    G: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();

    for (condition, body) in clauses {
        let was_in_condition = state.in_condition;
        state.in_condition = true;
        let code = run_condition_list(state, condition, &mut result, &mut eval_condition);
        state.in_condition = was_in_condition;
        let code = code?;

        if code == 0 {
            run_body(state, body, &mut result, &mut exec_stmt)?;
            return Ok(result);
        }
    }

    if let Some(body) = else_body {
        run_body(state, body, &mut result, &mut exec_stmt)?;
    }

    Ok(result)
}

/// Handle a break/continue error raised from a loop body.
/// Returns `Ok(true)` if the loop should stop iterating (break absorbed here,
/// or nothing to do), `Ok(false)` if iteration should continue, and re-raises
/// (via Err) any break/continue that targets an outer loop.
pub(crate) enum LoopSignal {
    Stop,
    Continue,
}

pub(crate) fn handle_loop_error(err: InterpreterError) -> Result<LoopSignal, InterpreterError> {
    match err {
        InterpreterError::Break(b) => {
            if b.levels <= 1 {
                Ok(LoopSignal::Stop)
            } else {
                Err(InterpreterError::Break(crate::interpreter::errors::BreakError::new(
                    b.levels - 1,
                    b.stdout,
                    b.stderr,
                )))
            }
        }
        InterpreterError::Continue(c) => {
            if c.levels <= 1 {
                Ok(LoopSignal::Continue)
            } else {
                Err(InterpreterError::Continue(crate::interpreter::errors::ContinueError::new(
                    c.levels - 1,
                    c.stdout,
                    c.stderr,
                )))
            }
        }
        other => Err(other),
    }
}

/// Execute a `for VAR in WORDS; do ...; done` loop.
pub fn execute_for<G>(
    state: &mut InterpreterState,
    variable: &str,
    words: &[String],
    body: &[&StatementNode],
    max_iterations: u64,
    mut exec_stmt: G,
) -> Result<ForResult, InterpreterError>
where
    G: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();
    let was_loop = state.parent_has_loop_context;
    state.parent_has_loop_context = Some(true);
    state.loop_depth += 1;

    let mut iterations: u64 = 0;
    for word in words {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth -= 1;
            state.parent_has_loop_context = was_loop;
            return Err(InterpreterError::ExecutionLimit(
                crate::interpreter::errors::ExecutionLimitError::simple(
                    format!("too many loop iterations (>{})", max_iterations),
                    crate::interpreter::errors::LimitType::Iterations,
                ),
            ));
        }

        state.env.insert(variable.to_string(), word.clone());

        match run_body(state, body, &mut result, &mut exec_stmt) {
            Ok(()) => {}
            Err(e) => match handle_loop_error(e) {
                Ok(LoopSignal::Stop) => break,
                Ok(LoopSignal::Continue) => continue,
                Err(e) => {
                    state.loop_depth -= 1;
                    state.parent_has_loop_context = was_loop;
                    return Err(e);
                }
            },
        }
    }

    state.loop_depth -= 1;
    state.parent_has_loop_context = was_loop;
    Ok(result)
}

/// Execute a `while`/`until` loop. `invert` is true for `until`.
fn execute_while_like<F, G>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    invert: bool,
    mut eval_condition: F,
    mut exec_stmt: G,
) -> Result<ForResult, InterpreterError>
where
    F: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    G: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut result = ForResult::default();
    let was_loop = state.parent_has_loop_context;
    state.parent_has_loop_context = Some(true);
    state.loop_depth += 1;

    let mut iterations: u64 = 0;
    loop {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth -= 1;
            state.parent_has_loop_context = was_loop;
            return Err(InterpreterError::ExecutionLimit(
                crate::interpreter::errors::ExecutionLimitError::simple(
                    format!("too many loop iterations (>{})", max_iterations),
                    crate::interpreter::errors::LimitType::Iterations,
                ),
            ));
        }

        let was_in_condition = state.in_condition;
        state.in_condition = true;
        let code_result = run_condition_list(state, condition, &mut result, &mut eval_condition);
        state.in_condition = was_in_condition;
        let code = match code_result {
            Ok(c) => c,
            Err(e) => {
                state.loop_depth -= 1;
                state.parent_has_loop_context = was_loop;
                return Err(e);
            }
        };

        let should_run = if invert { code != 0 } else { code == 0 };
        if !should_run {
            break;
        }

        match run_body(state, body, &mut result, &mut exec_stmt) {
            Ok(()) => {}
            Err(e) => match handle_loop_error(e) {
                Ok(LoopSignal::Stop) => break,
                Ok(LoopSignal::Continue) => continue,
                Err(e) => {
                    state.loop_depth -= 1;
                    state.parent_has_loop_context = was_loop;
                    return Err(e);
                }
            },
        }
    }

    state.loop_depth -= 1;
    state.parent_has_loop_context = was_loop;
    Ok(result)
}

/// Execute a `while COND; do ...; done` loop.
pub fn execute_while<F, G>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    eval_condition: F,
    exec_stmt: G,
) -> Result<ForResult, InterpreterError>
where
    F: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    G: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    execute_while_like(state, condition, body, max_iterations, false, eval_condition, exec_stmt)
}

/// Execute an `until COND; do ...; done` loop.
pub fn execute_until<F, G>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    eval_condition: F,
    exec_stmt: G,
) -> Result<ForResult, InterpreterError>
where
    F: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    G: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    execute_while_like(state, condition, body, max_iterations, true, eval_condition, exec_stmt)
}

/// Validate that a variable name is a valid identifier.
/// Returns true if valid, false otherwise.
pub fn is_valid_identifier(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
    re.is_match(name)
}

/// Case statement terminator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTerminator {
    /// ;; - stop, no fall-through
    Break,
    /// ;& - unconditional fall-through (execute next body without pattern check)
    FallThrough,
    /// ;;& - continue pattern matching (check next case patterns)
    ContinueMatching,
}

impl CaseTerminator {
    /// Parse a terminator string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ";;" => Some(CaseTerminator::Break),
            ";&" => Some(CaseTerminator::FallThrough),
            ";;&" => Some(CaseTerminator::ContinueMatching),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseTerminator::Break => ";;",
            CaseTerminator::FallThrough => ";&",
            CaseTerminator::ContinueMatching => ";;&",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("_bar"));
        assert!(is_valid_identifier("foo123"));
        assert!(is_valid_identifier("_123"));
        assert!(!is_valid_identifier("123foo"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("foo bar"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_case_terminator() {
        assert_eq!(CaseTerminator::from_str(";;"), Some(CaseTerminator::Break));
        assert_eq!(CaseTerminator::from_str(";&"), Some(CaseTerminator::FallThrough));
        assert_eq!(CaseTerminator::from_str(";;&"), Some(CaseTerminator::ContinueMatching));
        assert_eq!(CaseTerminator::from_str("invalid"), None);

        assert_eq!(CaseTerminator::Break.as_str(), ";;");
        assert_eq!(CaseTerminator::FallThrough.as_str(), ";&");
        assert_eq!(CaseTerminator::ContinueMatching.as_str(), ";;&");
    }
}
