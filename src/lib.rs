//! command-stream - Programmable shell-command execution
//!
//! Commands are built by safe interpolation and return a [`Runner`] that
//! is awaitable for a final result, iterable over output chunks, an
//! emitter of lifecycle events, and an exposer of live stdio streams.
//! An in-process registry of virtual commands can substitute for
//! external binaries, and pipelines may freely mix the two.

pub mod cleanup;
pub mod commands;
pub mod error;
pub mod events;
pub mod options;
pub mod parser;
pub mod pipeline;
pub mod quote;
pub mod runner;
pub mod spawn;
pub mod state;
pub mod stream_util;
pub mod trace;

pub use commands::registry::{disable, enable, list, register, unregister};
pub use commands::{
    ByteReceiver, ChunkWriter, Command, CommandContext, CommandResult, Handler, StreamContext,
    StreamingCommand,
};
pub use cleanup::force_cleanup_all;
pub use error::{Error, Result};
pub use events::{ByteStream, ChunkEvent, ChunkStream, Event, EventStream, StreamKind};
pub use options::{RunOptions, StdinSource};
pub use quote::{build_command, literal, quote, raw, Interp};
pub use runner::{CommandSpec, ExecResult, Runner, RunnerState, StdinWriter};
pub use state::{reset_global_state, set, unset, ShellFlags};

/// Run a command string quietly: capture on, mirroring off.
pub fn run(command: &str) -> Runner {
    run_with(command, RunOptions::quiet())
}

/// Run a command string with explicit options.
pub fn run_with(command: &str, options: RunOptions) -> Runner {
    Runner::new(CommandSpec::Shell(command.to_string()), options)
}

/// Run a command string in shell mode with default options (mirroring
/// and capture both on).
pub fn sh(command: &str) -> Runner {
    sh_with(command, RunOptions::default())
}

/// Shell mode with explicit options.
pub fn sh_with(command: &str, options: RunOptions) -> Runner {
    Runner::new(CommandSpec::Shell(command.to_string()), options)
}

/// Run a program directly, bypassing parsing and the virtual registry.
pub fn exec(program: &str, args: &[&str]) -> Runner {
    exec_with(program, args, RunOptions::quiet())
}

/// Exec mode with explicit options.
pub fn exec_with(program: &str, args: &[&str], options: RunOptions) -> Runner {
    Runner::new(
        CommandSpec::Exec {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        },
        options,
    )
}

/// A command constructor with bound default options.
///
/// Builds runners from template segments and interpolated values, the
/// way the tagged-template surface does, applying the factory's options
/// to every command it creates.
#[derive(Clone, Default)]
pub struct CommandFactory {
    defaults: RunOptions,
}

impl CommandFactory {
    pub fn new(defaults: RunOptions) -> Self {
        Self { defaults }
    }

    /// Interpolate values into template segments and return a runner.
    pub fn command(&self, segments: &[&str], values: &[Interp]) -> Runner {
        let command = build_command(segments, values);
        Runner::new(CommandSpec::Shell(command), self.defaults.clone())
    }

    /// Run a pre-built command string with the bound defaults.
    pub fn run(&self, command: &str) -> Runner {
        Runner::new(CommandSpec::Shell(command.to_string()), self.defaults.clone())
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::{Mutex, MutexGuard};

    lazy_static::lazy_static! {
        static ref GLOBAL_STATE_LOCK: Mutex<()> = Mutex::new(());
    }

    /// Serializes tests that touch process-wide state (shell flags, the
    /// registry enable flag).
    pub(crate) fn lock_global() -> MutexGuard<'static, ()> {
        GLOBAL_STATE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// Integration tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_echo_hello() {
        let result = run("echo hello").wait().await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.as_deref(), Some("hello\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_virtual_pipeline() {
        let result = run("seq 1 3 | cat").wait().await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.as_deref(), Some("1\n2\n3\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_virtual_pipeline_with_grep() {
        let result = run("seq 1 10 | grep 1 | wc -l").wait().await.unwrap();
        // 1 and 10 match.
        assert_eq!(result.stdout.unwrap().trim(), "2");
        assert_eq!(result.code, 0);
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_mixed_pipeline_virtual_head_external_tail() {
        // seq is virtual; /bin/cat is external.
        let result = run("seq 1 3 | /bin/cat").wait().await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.as_deref(), Some("1\n2\n3\n"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_mixed_pipeline_external_head_virtual_tail() {
        let result = run("/bin/sh -c \"printf '1\\n2\\n3\\n'\" | wc -l")
            .wait()
            .await
            .unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.unwrap().trim(), "3");
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_shell_passthrough_operators() {
        let result = run("echo a && echo b").wait().await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.as_deref(), Some("a\nb\n"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_shell_passthrough_redirection() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.txt");
        let command = format!("echo hi > {}", path.display());
        let result = run(&command).wait().await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pipeline_of_one_matches_direct_run() {
        let direct = run("echo solo").wait().await.unwrap();
        let pipeline = Runner::new(
            CommandSpec::Pipeline(vec![parser::Stage::new("echo", &["solo"])]),
            RunOptions::quiet(),
        )
        .wait()
        .await
        .unwrap();
        assert_eq!(direct, pipeline);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_earlier_stage_stderr_reaches_final_result() {
        let result = run("grep [ | cat").wait().await.unwrap();
        // Last stage succeeds, so the pipeline does too.
        assert_eq!(result.code, 0);
        assert!(result.stderr.unwrap().contains("invalid pattern"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pipefail_reports_leftmost_failure() {
        let _guard = test_util::lock_global();
        set("pipefail");
        let result = run("exit 3 | cat").wait().await;
        unset("pipefail");
        assert_eq!(result.unwrap().code, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_without_pipefail_last_stage_wins() {
        let _guard = test_util::lock_global();
        let result = run("exit 3 | cat").wait().await.unwrap();
        assert_eq!(result.code, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_infinite_producer_stopped_by_downstream() {
        let result = run("yes | head -n 3").wait().await.unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.as_deref(), Some("y\ny\ny\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_registered_handler_substitutes_for_external() {
        register(
            "greet",
            Handler::batched_fn(|ctx: CommandContext| async move {
                CommandResult::success(format!("Hello, {}!", ctx.args[0]))
            }),
        );
        let result = run("greet Rust").wait().await.unwrap();
        unregister("greet");
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.as_deref(), Some("Hello, Rust!"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_streaming_handler_round_trip() {
        register(
            "double",
            Handler::streaming_fn(|mut ctx: StreamContext| async move {
                while let Some(chunk) = ctx.input.next().await {
                    if !ctx.stdout.write(chunk.clone()).await {
                        break;
                    }
                    if !ctx.stdout.write(chunk).await {
                        break;
                    }
                }
                0
            }),
        );
        let result = run_with(
            "double",
            RunOptions {
                stdin: StdinSource::from("ab"),
                ..RunOptions::quiet()
            },
        )
        .wait()
        .await
        .unwrap();
        unregister("double");
        assert_eq!(result.stdout.as_deref(), Some("abab"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_which_finds_external_program() {
        let result = run("which sh").wait().await.unwrap();
        assert_eq!(result.code, 0);
        let path = result.stdout.unwrap();
        assert!(path.starts_with('/'));
        assert!(path.ends_with("sh\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_which_missing_program() {
        let result = run("which definitely-not-installed-zzz").wait().await.unwrap();
        assert_eq!(result.code, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_factory_binds_defaults() {
        let factory = CommandFactory::new(RunOptions::quiet());
        let result = factory
            .command(&["echo ", ""], &["two words".into()])
            .wait()
            .await
            .unwrap();
        assert_eq!(result.stdout.as_deref(), Some("two words\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_interpolated_metachars_do_not_execute() {
        let factory = CommandFactory::new(RunOptions::quiet());
        let evil = "; echo injected";
        let result = factory
            .command(&["echo ", ""], &[evil.into()])
            .wait()
            .await
            .unwrap();
        assert_eq!(result.stdout.as_deref(), Some("; echo injected\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_exec_mode_bypasses_virtual_registry() {
        let _guard = test_util::lock_global();
        register(
            "exec-bypass-probe",
            Handler::batched_fn(|_ctx: CommandContext| async move {
                CommandResult::success("virtual\n".to_string())
            }),
        );
        // Exec mode must not consult the registry: this program does not
        // exist on disk, so the spawn fails instead of dispatching.
        let outcome = exec("exec-bypass-probe", &[]).wait().await;
        unregister("exec-bypass-probe");
        assert!(matches!(outcome, Err(Error::SpawnFailed { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wait_blocking() {
        let result = run("echo sync").wait_blocking().unwrap();
        assert_eq!(result.stdout.as_deref(), Some("sync\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wait_blocking_refused_after_async_start() {
        let r = run("sleep 5");
        let _chunks = r.chunks();
        assert!(matches!(r.wait_blocking(), Err(Error::AlreadyStarted)));
        r.kill(None);
        let _ = r.wait().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_force_cleanup_with_no_runners_is_noop() {
        force_cleanup_all();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reset_global_state_restores_defaults() {
        let _guard = test_util::lock_global();
        set("e");
        set("pipefail");
        disable();
        reset_global_state();
        let flags = state::flags();
        assert!(!flags.errexit);
        assert!(!flags.pipefail);
        let result = run("echo back").wait().await.unwrap();
        assert_eq!(result.stdout.as_deref(), Some("back\n"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_runner_registers_while_live() {
        let r = run("sleep 0.2");
        let mut events = r.subscribe();
        assert!(matches!(events.next().await, Some(Event::Start)));
        // Registered between start and finalization.
        assert!(cleanup::active_count() >= 1);
        r.wait().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cd_changes_process_directory() {
        let _guard = test_util::lock_global();
        let original = std::env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let command = format!("cd {}", quote(&tmp.path().display().to_string()));
        let result = run(&command).wait().await.unwrap();
        assert_eq!(result.code, 0);
        let changed = std::env::current_dir().unwrap();
        std::env::set_current_dir(&original).unwrap();
        assert_eq!(
            changed.canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }
}
