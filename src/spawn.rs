//! External Process Spawning
//!
//! Spawns children in their own process group (Unix) so signals reach
//! the whole group, picks the host shell for operator-bearing commands,
//! and maps exit statuses to the conventional code space
//! (127 not-found, 128+N signaled).

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::Error;

#[cfg(unix)]
pub(crate) const SIGINT: i32 = libc::SIGINT;
#[cfg(not(unix))]
pub(crate) const SIGINT: i32 = 2;

#[cfg(unix)]
pub(crate) const SIGKILL: i32 = libc::SIGKILL;
#[cfg(not(unix))]
pub(crate) const SIGKILL: i32 = 9;

#[cfg(unix)]
pub(crate) const SIGTERM: i32 = libc::SIGTERM;
#[cfg(not(unix))]
pub(crate) const SIGTERM: i32 = 15;

/// Exit code for a program that could not be found or started.
pub const CODE_SPAWN_FAILED: i32 = 127;
/// Exit code for an interrupted run.
pub const CODE_INTERRUPTED: i32 = 130;
/// Exit code for a hard kill.
pub const CODE_KILLED: i32 = 137;
/// Exit code for termination, also used when the signal is unknown.
pub const CODE_TERMINATED: i32 = 143;

/// Stdio policy for one side of a spawned child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StdioPolicy {
    Piped,
    Inherit,
    Null,
}

impl StdioPolicy {
    fn to_stdio(self) -> Stdio {
        match self {
            StdioPolicy::Piped => Stdio::piped(),
            StdioPolicy::Inherit => Stdio::inherit(),
            StdioPolicy::Null => Stdio::null(),
        }
    }
}

pub(crate) struct SpawnConfig {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub stdin: StdioPolicy,
    pub stdout: StdioPolicy,
    pub stderr: StdioPolicy,
}

pub(crate) struct SpawnedChild {
    pub child: Child,
    /// Process-group id on Unix; `None` where groups are unavailable.
    pub pgid: Option<i32>,
}

/// The host shell invocation for a command that needs real shell
/// features. Prefers Git-Bash on Windows, falling back to the system
/// command interpreter.
pub(crate) fn shell_invocation(command: &str) -> (String, Vec<String>) {
    #[cfg(unix)]
    {
        ("/bin/sh".to_string(), vec!["-c".to_string(), command.to_string()])
    }
    #[cfg(windows)]
    {
        for candidate in [
            "C:\\Program Files\\Git\\bin\\bash.exe",
            "C:\\Program Files (x86)\\Git\\bin\\bash.exe",
        ] {
            if std::path::Path::new(candidate).is_file() {
                return (
                    candidate.to_string(),
                    vec!["-c".to_string(), command.to_string()],
                );
            }
        }
        let comspec = std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string());
        (comspec, vec!["/C".to_string(), command.to_string()])
    }
}

/// Spawn a child per the config. On Unix the child is moved into a new
/// process group before exec so the whole group can be signaled.
pub(crate) fn spawn(config: SpawnConfig) -> Result<SpawnedChild, Error> {
    let mut command = Command::new(&config.program);
    command
        .args(&config.args)
        .current_dir(&config.cwd)
        .env_clear()
        .envs(&config.env)
        .stdin(config.stdin.to_stdio())
        .stdout(config.stdout.to_stdio())
        .stderr(config.stderr.to_stdio())
        .kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        command.pre_exec(|| {
            libc::setpgid(0, 0);
            Ok(())
        });
    }

    let child = command.spawn().map_err(|e| Error::SpawnFailed {
        program: config.program.clone(),
        message: e.to_string(),
    })?;

    let pgid = child.id().map(|pid| pid as i32).filter(|_| cfg!(unix));
    if let Some(pgid) = pgid {
        crate::cleanup::track_group(pgid);
    }
    Ok(SpawnedChild { child, pgid })
}

/// Signal a whole process group. Falls back to a no-op where process
/// groups are unavailable; the caller then kills the direct child.
#[cfg(unix)]
pub(crate) fn kill_group(pgid: i32, signal: i32) {
    unsafe {
        libc::killpg(pgid, signal);
    }
}

#[cfg(not(unix))]
pub(crate) fn kill_group(_pgid: i32, _signal: i32) {}

/// Map an exit status to the conventional code space.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .unwrap_or_else(|| 128 + status.signal().unwrap_or(15))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

/// Synthesized code for a delivered signal.
pub(crate) fn signal_code(signal: i32) -> i32 {
    #[cfg(unix)]
    {
        128 + signal
    }
    #[cfg(not(unix))]
    {
        let _ = signal;
        CODE_TERMINATED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_true_in_own_group() {
        let spawned = spawn(SpawnConfig {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "exit 0".to_string()],
            cwd: std::env::current_dir().unwrap(),
            env: std::env::vars().collect(),
            stdin: StdioPolicy::Null,
            stdout: StdioPolicy::Null,
            stderr: StdioPolicy::Null,
        });
        let mut spawned = spawned.unwrap();
        assert!(spawned.pgid.is_some());
        let status = spawned.child.wait().await.unwrap();
        assert_eq!(exit_code(status), 0);
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let err = spawn(SpawnConfig {
            program: "/definitely/not/a/program".to_string(),
            args: vec![],
            cwd: std::env::current_dir().unwrap(),
            env: std::env::vars().collect(),
            stdin: StdioPolicy::Null,
            stdout: StdioPolicy::Null,
            stderr: StdioPolicy::Null,
        });
        assert!(matches!(err, Err(Error::SpawnFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_invocation_is_bourne() {
        let (program, args) = shell_invocation("echo hi | wc -c");
        assert_eq!(program, "/bin/sh");
        assert_eq!(args[0], "-c");
        assert_eq!(args[1], "echo hi | wc -c");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_code_mapping() {
        assert_eq!(signal_code(libc::SIGINT), CODE_INTERRUPTED);
        assert_eq!(signal_code(libc::SIGKILL), CODE_KILLED);
        assert_eq!(signal_code(libc::SIGTERM), CODE_TERMINATED);
    }
}
