//! Runner Types
//!
//! Shared types for the command runner: the immutable command
//! specification, the lifecycle state, and the final result record.

use std::fmt;

use crate::parser::Stage;

/// What a runner executes. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// A command string to be parsed; shell operators may force a real
    /// shell invocation.
    Shell(String),
    /// A program and arguments, spawned directly with no parsing.
    Exec { program: String, args: Vec<String> },
    /// An ordered sequence of pipeline stages composed with `|`.
    Pipeline(Vec<Stage>),
}

impl CommandSpec {
    /// Human-readable form, used by tracing and error messages.
    pub fn display(&self) -> String {
        match self {
            CommandSpec::Shell(cmd) => cmd.clone(),
            CommandSpec::Exec { program, args } => {
                let mut out = crate::quote::quote(program);
                for arg in args {
                    out.push(' ');
                    out.push_str(&crate::quote::quote(arg));
                }
                out
            }
            CommandSpec::Pipeline(stages) => stages
                .iter()
                .map(|s| {
                    let mut argv = vec![s.program.clone()];
                    argv.extend(s.args.iter().cloned());
                    crate::quote::quote_list(&argv)
                })
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Lifecycle of a runner. The terminal state is reached at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Created,
    Started,
    Finalizing,
    Finished,
}

/// Final result of a run.
///
/// `code` is the child's exit status, or a synthesized value on timeout,
/// signal, or virtual-command failure. The captured strings are present
/// iff the run was configured with `capture`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub stdin: Option<String>,
}

impl ExecResult {
    pub fn new(code: i32, stdout: Option<String>, stderr: Option<String>) -> Self {
        Self {
            code,
            stdout,
            stderr,
            stdin: None,
        }
    }

    /// A captured result with empty streams.
    pub fn empty(code: i32) -> Self {
        Self {
            code,
            stdout: Some(String::new()),
            stderr: Some(String::new()),
            stdin: None,
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Captured stdout, or empty when capture was off.
    pub fn stdout_str(&self) -> &str {
        self.stdout.as_deref().unwrap_or("")
    }

    /// Captured stderr, or empty when capture was off.
    pub fn stderr_str(&self) -> &str {
        self.stderr.as_deref().unwrap_or("")
    }
}

impl fmt::Display for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit {}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display_exec_quotes_args() {
        let spec = CommandSpec::Exec {
            program: "echo".to_string(),
            args: vec!["two words".to_string()],
        };
        assert_eq!(spec.display(), "echo 'two words'");
    }

    #[test]
    fn test_spec_display_pipeline() {
        let spec = CommandSpec::Pipeline(vec![
            Stage::new("seq", &["1", "3"]),
            Stage::new("cat", &[]),
        ]);
        assert_eq!(spec.display(), "seq 1 3 | cat");
    }

    #[test]
    fn test_exec_result_accessors() {
        let r = ExecResult::empty(0);
        assert!(r.success());
        assert_eq!(r.stdout_str(), "");

        let r = ExecResult::new(3, None, None);
        assert!(!r.success());
        assert_eq!(r.stderr_str(), "");
    }
}
