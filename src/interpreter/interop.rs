//! Host interop registry
//!
//! Scripts call out to embedding-host functions as `namespace.name` (see
//! simple command dispatch order in `execution_engine`: this check runs
//! before alias/function/builtin/PATH resolution, as soon as the command
//! name is expanded and found to contain a `.`). This module only carries
//! the runtime calling convention — registration and the actual host
//! functions are the embedder's business, analogous to how
//! `commands::CommandRegistry` carries coreutils-style commands rather
//! than implementing them here.

use std::collections::HashMap;
use std::sync::Arc;

use crate::interpreter::types::ExecResult;

/// Read/write view of session state handed to a host function. Mirrors
/// the subset of `InterpreterState` an interop call is allowed to see:
/// the flat variable environment and the current working directory.
/// `update_state` deltas are merged back into the caller's environment
/// after the call returns.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub env: HashMap<String, String>,
    pub cwd: String,
}

/// Everything a host function receives for one invocation.
pub struct InteropArgs {
    pub args: Vec<String>,
    pub stdin: String,
    pub session: SessionView,
}

/// The result shapes a host function may return, normalized by the
/// executor into the same `ExecResult`/control-flow shape a builtin or
/// pipeline stage would produce.
pub enum InteropResult {
    /// Exit code 0, no state change.
    Ok,
    /// Exit with the given code, no state change.
    OkWithCode(i32),
    /// Exit with the given code and merge `new_state` into the session.
    OkWithCodeAndState(i32, HashMap<String, String>),
    /// The call failed; `message` is written to stderr and exit code is 1.
    Error(String),
    /// Loop-valid only: behaves like the `continue` builtin.
    Continue,
    /// Loop-valid only: behaves like the `break` builtin.
    Break,
}

/// A registered host function: receives args/stdin/session view, writes
/// to the provided stdout/stderr buffers as it runs, and returns one of
/// the `InteropResult` variants.
pub type InteropFn = dyn Fn(&InteropArgs, &mut String, &mut String) -> InteropResult + Send + Sync;

/// Dispatch table keyed by `(namespace, name)`, exactly as described for
/// simple command dispatch: `namespace.name` splits on the first `.`.
#[derive(Default)]
pub struct InteropRegistry {
    functions: HashMap<(String, String), Arc<InteropFn>>,
}

impl InteropRegistry {
    pub fn new() -> Self {
        Self { functions: HashMap::new() }
    }

    pub fn register(&mut self, namespace: &str, name: &str, f: Arc<InteropFn>) {
        self.functions.insert((namespace.to_string(), name.to_string()), f);
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.functions.contains_key(&(namespace.to_string(), name.to_string()))
    }

    /// Split a dotted command name into `(namespace, name)`. Only the
    /// first `.` is significant; a dotted name with no registered
    /// function still counts as namespace dispatch (and should produce a
    /// "command not found", not fall through to `$PATH`), per the
    /// dispatch order: namespace check happens before builtins/PATH.
    pub fn split_dotted(name: &str) -> Option<(&str, &str)> {
        let idx = name.find('.')?;
        Some((&name[..idx], &name[idx + 1..]))
    }

    /// Invoke the registered function for `namespace.name`, normalizing
    /// its `InteropResult` into the executor's result shape. Returns
    /// `None` if nothing is registered for that pair.
    pub fn dispatch(
        &self,
        namespace: &str,
        name: &str,
        args: Vec<String>,
        stdin: String,
        session: SessionView,
    ) -> Option<InteropOutcome> {
        let f = self.functions.get(&(namespace.to_string(), name.to_string()))?;
        let call_args = InteropArgs { args, stdin, session };
        let mut stdout = String::new();
        let mut stderr = String::new();
        let result = f(&call_args, &mut stdout, &mut stderr);

        Some(match result {
            InteropResult::Ok => InteropOutcome::Result(ExecResult::new(stdout, stderr, 0)),
            InteropResult::OkWithCode(code) => {
                InteropOutcome::Result(ExecResult::new(stdout, stderr, code))
            }
            InteropResult::OkWithCodeAndState(code, new_state) => InteropOutcome::Result(
                ExecResult { stdout, stderr, exit_code: code, env: Some(new_state) },
            ),
            InteropResult::Error(message) => {
                stderr.push_str(&message);
                if !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                InteropOutcome::Result(ExecResult::new(stdout, stderr, 1))
            }
            InteropResult::Continue => InteropOutcome::Continue,
            InteropResult::Break => InteropOutcome::Break,
        })
    }
}

/// What an interop dispatch produced: either a normal result, or a
/// loop-control signal that the caller must translate into the same
/// `InterpreterError::Break`/`Continue` the `break`/`continue` builtins
/// raise.
pub enum InteropOutcome {
    Result(ExecResult),
    Continue,
    Break,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_dotted_name() {
        assert_eq!(InteropRegistry::split_dotted("fs.read"), Some(("fs", "read")));
        assert_eq!(InteropRegistry::split_dotted("echo"), None);
        assert_eq!(InteropRegistry::split_dotted("a.b.c"), Some(("a", "b.c")));
    }

    #[test]
    fn dispatch_runs_registered_function_and_merges_state() {
        let mut registry = InteropRegistry::new();
        registry.register(
            "kv",
            "set",
            Arc::new(|call: &InteropArgs, stdout: &mut String, _stderr: &mut String| {
                stdout.push_str("ok\n");
                let mut new_state = HashMap::new();
                new_state.insert("LAST_KV".to_string(), call.args.join(","));
                InteropResult::OkWithCodeAndState(0, new_state)
            }),
        );

        let outcome = registry
            .dispatch(
                "kv",
                "set",
                vec!["a".to_string(), "b".to_string()],
                String::new(),
                SessionView::default(),
            )
            .unwrap();

        match outcome {
            InteropOutcome::Result(result) => {
                assert_eq!(result.exit_code, 0);
                assert_eq!(result.stdout, "ok\n");
                assert_eq!(result.env.unwrap().get("LAST_KV").unwrap(), "a,b");
            }
            _ => panic!("expected a Result outcome"),
        }
    }

    #[test]
    fn dispatch_returns_none_when_unregistered() {
        let registry = InteropRegistry::new();
        assert!(registry.dispatch("nope", "nope", vec![], String::new(), SessionView::default()).is_none());
    }
}
