//! Pipeline Executor
//!
//! Executes a plan of virtual and external stages. Virtual stages run as
//! in-process tasks; contiguous external runs are handed to the host
//! shell as one `|`-joined invocation so OS pipe buffers do the work
//! (except under pipefail, where per-stage codes are required and each
//! external stage gets its own process). Stage boundaries are bounded
//! byte channels that forward chunks without coalescing.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::commands::types::{
    ByteReceiver, ChunkWriter, Command, CommandContext, Handler, StreamContext, StreamingCommand,
};
use crate::commands::registry;
use crate::error::Error;
use crate::events::ChunkEvent;
use crate::options::{RunOptions, SharedReader};
use crate::parser::{self, ParsedCommand, Stage};
use crate::runner::types::CommandSpec;
use crate::spawn::{
    self, SpawnConfig, StdioPolicy, CODE_SPAWN_FAILED,
};

const CHANNEL_DEPTH: usize = 32;
const READ_CHUNK: usize = 8192;

/// One stage of an execution plan, classified at start time.
#[derive(Clone)]
pub(crate) enum StagePlan {
    Virtual {
        name: String,
        args: Vec<String>,
        handler: Handler,
    },
    External {
        program: String,
        args: Vec<String>,
    },
}

/// What the runner executes after consulting the parser and registry.
pub(crate) enum ExecutionPlan {
    /// The whole command string goes to the host shell.
    ShellPassthrough(String),
    /// Parsed stages, each virtual or external.
    Stages(Vec<StagePlan>),
}

fn classify(stage: &Stage) -> StagePlan {
    match registry::lookup(&stage.program) {
        Some(handler) => StagePlan::Virtual {
            name: stage.program.clone(),
            args: stage.args.clone(),
            handler,
        },
        None => StagePlan::External {
            program: stage.program.clone(),
            args: stage.args.clone(),
        },
    }
}

/// Decide how a spec executes. Exec mode bypasses both parsing and the
/// virtual registry.
pub(crate) fn build_plan(spec: &CommandSpec, options: &RunOptions) -> Result<ExecutionPlan, Error> {
    match spec {
        CommandSpec::Exec { program, args } => Ok(ExecutionPlan::Stages(vec![StagePlan::External {
            program: program.clone(),
            args: args.clone(),
        }])),
        CommandSpec::Pipeline(stages) => {
            if stages.is_empty() {
                return Err(Error::ParseFailed("empty pipeline".to_string()));
            }
            Ok(ExecutionPlan::Stages(stages.iter().map(classify).collect()))
        }
        CommandSpec::Shell(command) => {
            if !options.shell_operators {
                let stage = parser::parse_words(command)?;
                return Ok(ExecutionPlan::Stages(vec![classify(&stage)]));
            }
            match parser::parse(command)? {
                ParsedCommand::NeedsShell => Ok(ExecutionPlan::ShellPassthrough(command.clone())),
                ParsedCommand::Simple(stage) => Ok(ExecutionPlan::Stages(vec![classify(&stage)])),
                ParsedCommand::Pipeline(stages) => {
                    Ok(ExecutionPlan::Stages(stages.iter().map(classify).collect()))
                }
            }
        }
    }
}

/// Stdin feed for the first segment.
pub(crate) enum StdinFeed {
    Empty,
    Inherit,
    Bytes(Vec<u8>),
    Reader(SharedReader),
    Channel(mpsc::Receiver<Vec<u8>>),
}

/// Shared context for one pipeline execution.
pub(crate) struct ExecContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub capture: bool,
    pub interactive: bool,
    /// Final stdout and live stderr chunks flow here, in arrival order.
    pub sink: mpsc::Sender<ChunkEvent>,
    pub kill_rx: watch::Receiver<Option<i32>>,
    /// Capture buffer for bytes pumped from a reader stdin source.
    pub input_capture: Option<Arc<Mutex<Vec<u8>>>>,
}

/// Per-segment results, in pipeline order.
pub(crate) struct PipelineOutcome {
    pub codes: Vec<i32>,
    /// Captured stderr per segment; empty buffers when capture is off.
    pub stage_stderr: Vec<Vec<u8>>,
    /// First spawn failure, surfaced as an error from a wait.
    pub spawn_error: Option<Error>,
    /// First virtual handler failure message.
    pub virtual_error: Option<String>,
}

enum Segment {
    Virtual {
        name: String,
        args: Vec<String>,
        handler: Handler,
    },
    External {
        program: String,
        args: Vec<String>,
    },
}

/// Coalesce contiguous external stages into single shell invocations.
/// Under pipefail each external stage keeps its own process so the
/// per-stage exit codes exist.
fn build_segments(stages: Vec<StagePlan>, pipefail: bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut external_run: Vec<(String, Vec<String>)> = Vec::new();

    let flush = |run: &mut Vec<(String, Vec<String>)>, segments: &mut Vec<Segment>| {
        if run.is_empty() {
            return;
        }
        if run.len() == 1 {
            let (program, args) = run.remove(0);
            segments.push(Segment::External { program, args });
            return;
        }
        let joined = run
            .iter()
            .map(|(program, args)| {
                let mut argv = vec![program.clone()];
                argv.extend(args.iter().cloned());
                crate::quote::quote_list(&argv)
            })
            .collect::<Vec<_>>()
            .join(" | ");
        let (shell, shell_args) = spawn::shell_invocation(&joined);
        segments.push(Segment::External {
            program: shell,
            args: shell_args,
        });
        run.clear();
    };

    for stage in stages {
        match stage {
            StagePlan::External { program, args } if !pipefail => {
                external_run.push((program, args));
            }
            StagePlan::External { program, args } => {
                segments.push(Segment::External { program, args });
            }
            StagePlan::Virtual {
                name,
                args,
                handler,
            } => {
                flush(&mut external_run, &mut segments);
                segments.push(Segment::Virtual {
                    name,
                    args,
                    handler,
                });
            }
        }
    }
    flush(&mut external_run, &mut segments);
    segments
}

/// Where a segment's stdout goes.
enum SegmentOutput {
    /// Middle of the pipeline: bytes to the next segment.
    Channel(mpsc::Sender<Vec<u8>>),
    /// Last segment: chunks to the runner's sink.
    Sink(mpsc::Sender<ChunkEvent>),
}

/// Stderr destination: mirrored/emitted as it arrives, captured per
/// segment for pipeline-order assembly.
#[derive(Clone)]
struct StderrOut {
    sink: mpsc::Sender<ChunkEvent>,
    buffer: Option<Arc<Mutex<Vec<u8>>>>,
}

impl StderrOut {
    async fn emit(&self, data: Vec<u8>) {
        if let Some(buffer) = &self.buffer {
            buffer.lock().unwrap().extend_from_slice(&data);
        }
        let _ = self.sink.send(ChunkEvent::stderr(data)).await;
    }
}

/// Execute the plan. Returns after every segment has finished and all
/// of its output has been forwarded to the sink.
pub(crate) async fn execute(plan: ExecutionPlan, input: StdinFeed, ctx: ExecContext) -> PipelineOutcome {
    let pipefail = crate::state::flags().pipefail;
    let segments = match plan {
        ExecutionPlan::ShellPassthrough(command) => {
            let (shell, args) = spawn::shell_invocation(&command);
            vec![Segment::External {
                program: shell,
                args,
            }]
        }
        ExecutionPlan::Stages(stages) => build_segments(stages, pipefail),
    };

    let count = segments.len();
    let stderr_buffers: Vec<Arc<Mutex<Vec<u8>>>> =
        (0..count).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();

    let mut handles: Vec<JoinHandle<(i32, Option<Error>, Option<String>)>> = Vec::new();
    let mut upstream = input;

    for (index, segment) in segments.into_iter().enumerate() {
        let last = index == count - 1;
        let (output, next_input) = if last {
            (SegmentOutput::Sink(ctx.sink.clone()), StdinFeed::Empty)
        } else {
            let (tx, rx) = mpsc::channel::<Vec<u8>>(CHANNEL_DEPTH);
            (SegmentOutput::Channel(tx), StdinFeed::Channel(rx))
        };
        let errs = StderrOut {
            sink: ctx.sink.clone(),
            buffer: ctx.capture.then(|| stderr_buffers[index].clone()),
        };
        let seg_input = std::mem::replace(&mut upstream, next_input);
        let input_capture = if index == 0 {
            ctx.input_capture.clone()
        } else {
            None
        };
        let kill_rx = ctx.kill_rx.clone();
        let cwd = ctx.cwd.clone();
        let env = ctx.env.clone();
        let interactive = ctx.interactive && count == 1;

        let handle = match segment {
            Segment::External { program, args } => tokio::spawn(run_external(
                program,
                args,
                seg_input,
                output,
                errs,
                cwd,
                env,
                interactive,
                kill_rx,
                input_capture,
            )),
            Segment::Virtual {
                name,
                args,
                handler,
            } => tokio::spawn(run_virtual(
                name,
                args,
                handler,
                seg_input,
                output,
                errs,
                cwd,
                env,
                kill_rx,
                input_capture,
            )),
        };
        handles.push(handle);
    }

    let mut outcome = PipelineOutcome {
        codes: Vec::with_capacity(count),
        stage_stderr: Vec::with_capacity(count),
        spawn_error: None,
        virtual_error: None,
    };
    for handle in handles {
        let (code, spawn_error, virtual_error) = match handle.await {
            Ok(result) => result,
            Err(e) => (1, None, Some(format!("stage task failed: {}", e))),
        };
        outcome.codes.push(code);
        if outcome.spawn_error.is_none() {
            outcome.spawn_error = spawn_error;
        }
        if outcome.virtual_error.is_none() {
            outcome.virtual_error = virtual_error;
        }
    }
    outcome.stage_stderr = stderr_buffers
        .into_iter()
        .map(|buffer| std::mem::take(&mut *buffer.lock().unwrap()))
        .collect();
    outcome
}

/// Kill-request consumer. Delivers each distinct requested signal once,
/// including one requested before this consumer attached; otherwise
/// pends until a new request (or forever if the sender is gone).
struct KillSignal {
    rx: watch::Receiver<Option<i32>>,
    delivered: Option<i32>,
}

impl KillSignal {
    fn new(rx: watch::Receiver<Option<i32>>) -> Self {
        Self {
            rx,
            delivered: None,
        }
    }

    async fn next(&mut self) -> i32 {
        loop {
            let current = *self.rx.borrow();
            if let Some(signal) = current {
                if self.delivered != Some(signal) {
                    self.delivered = Some(signal);
                    return signal;
                }
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Turn a stdin feed into the incremental receiver handed to virtual
/// handlers, spawning a feeder task where needed.
fn virtual_input(
    feed: StdinFeed,
    capture: Option<Arc<Mutex<Vec<u8>>>>,
) -> ByteReceiver {
    match feed {
        // Virtual stages do not consume the host terminal.
        StdinFeed::Empty | StdinFeed::Inherit => ByteReceiver::empty(),
        StdinFeed::Channel(rx) => ByteReceiver::new(rx),
        StdinFeed::Bytes(bytes) => {
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                let _ = tx.send(bytes).await;
            });
            ByteReceiver::new(rx)
        }
        StdinFeed::Reader(shared) => {
            let (tx, rx) = mpsc::channel(4);
            tokio::spawn(async move {
                let Some(mut reader) = shared.take().await else {
                    return;
                };
                let mut buf = vec![0u8; READ_CHUNK];
                loop {
                    match reader.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            let chunk = buf[..n].to_vec();
                            if let Some(capture) = &capture {
                                capture.lock().unwrap().extend_from_slice(&chunk);
                            }
                            if tx.send(chunk).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
            ByteReceiver::new(rx)
        }
    }
}

/// Forward a virtual stage's stdout channel to its destination.
fn spawn_output_forwarder(
    mut rx: mpsc::Receiver<Vec<u8>>,
    output: SegmentOutput,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            match &output {
                SegmentOutput::Channel(tx) => {
                    if tx.send(chunk).await.is_err() {
                        return;
                    }
                }
                SegmentOutput::Sink(sink) => {
                    if sink.send(ChunkEvent::stdout(chunk)).await.is_err() {
                        return;
                    }
                }
            }
        }
    })
}

fn panic_message(e: tokio::task::JoinError) -> String {
    if e.is_panic() {
        let payload = e.into_panic();
        if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "handler panicked".to_string()
        }
    } else {
        "handler cancelled".to_string()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_virtual(
    name: String,
    args: Vec<String>,
    handler: Handler,
    input: StdinFeed,
    output: SegmentOutput,
    errs: StderrOut,
    cwd: PathBuf,
    env: HashMap<String, String>,
    kill_rx: watch::Receiver<Option<i32>>,
    input_capture: Option<Arc<Mutex<Vec<u8>>>>,
) -> (i32, Option<Error>, Option<String>) {
    match handler {
        Handler::Batched(command) => {
            run_batched(
                name,
                args,
                command,
                input,
                output,
                errs,
                cwd,
                env,
                kill_rx,
                input_capture,
            )
            .await
        }
        Handler::Streaming(command) => {
            run_streaming(
                name,
                args,
                command,
                input,
                output,
                errs,
                cwd,
                env,
                kill_rx,
                input_capture,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_batched(
    name: String,
    args: Vec<String>,
    command: Arc<dyn Command>,
    input: StdinFeed,
    output: SegmentOutput,
    errs: StderrOut,
    cwd: PathBuf,
    env: HashMap<String, String>,
    kill_rx: watch::Receiver<Option<i32>>,
    input_capture: Option<Arc<Mutex<Vec<u8>>>>,
) -> (i32, Option<Error>, Option<String>) {
    let mut input = virtual_input(input, input_capture);
    let mut kill = KillSignal::new(kill_rx);
    // Collect-then-execute runs inside its own task so a panicking
    // handler is isolated and a kill can abort mid-collect.
    let mut join = tokio::spawn(async move {
        let stdin = input.collect().await;
        let ctx = CommandContext {
            args,
            stdin,
            cwd,
            env,
        };
        command.execute(ctx).await
    });

    let result = tokio::select! {
        result = &mut join => result,
        signal = kill.next() => {
            join.abort();
            return (spawn::signal_code(signal), None, None);
        }
    };

    match result {
        Ok(result) => {
            if !result.stdout.is_empty() {
                match &output {
                    SegmentOutput::Channel(tx) => {
                        let _ = tx.send(result.stdout.into_bytes()).await;
                    }
                    SegmentOutput::Sink(sink) => {
                        let _ = sink
                            .send(ChunkEvent::stdout(result.stdout.into_bytes()))
                            .await;
                    }
                }
            }
            if !result.stderr.is_empty() {
                errs.emit(result.stderr.into_bytes()).await;
            }
            (result.exit_code, None, None)
        }
        Err(e) => {
            // A failing handler presents the same surface as a failing
            // external program: message on stderr, code 1.
            let message = panic_message(e);
            let described = Error::VirtualFailed {
                name,
                message: message.clone(),
            }
            .to_string();
            errs.emit(format!("{}\n", described).into_bytes()).await;
            (1, None, Some(described))
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_streaming(
    name: String,
    args: Vec<String>,
    command: Arc<dyn StreamingCommand>,
    input: StdinFeed,
    output: SegmentOutput,
    errs: StderrOut,
    cwd: PathBuf,
    env: HashMap<String, String>,
    kill_rx: watch::Receiver<Option<i32>>,
    input_capture: Option<Arc<Mutex<Vec<u8>>>>,
) -> (i32, Option<Error>, Option<String>) {
    let input = virtual_input(input, input_capture);
    let (stdout_tx, stdout_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_DEPTH);
    let (stderr_tx, mut stderr_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_DEPTH);

    let forwarder = spawn_output_forwarder(stdout_rx, output);
    let stderr_errs = errs.clone();
    let stderr_forwarder = tokio::spawn(async move {
        while let Some(chunk) = stderr_rx.recv().await {
            stderr_errs.emit(chunk).await;
        }
    });

    let ctx = StreamContext {
        args,
        input,
        stdout: ChunkWriter::new(stdout_tx),
        stderr: ChunkWriter::new(stderr_tx),
        cwd,
        env,
    };
    let mut join = tokio::spawn(async move { command.run(ctx).await });
    let mut kill = KillSignal::new(kill_rx);

    let outcome = tokio::select! {
        result = &mut join => match result {
            Ok(code) => (code, None, None),
            Err(e) => {
                let message = panic_message(e);
                let described = Error::VirtualFailed {
                    name,
                    message: message.clone(),
                }
                .to_string();
                errs.emit(format!("{}\n", described).into_bytes()).await;
                (1, None, Some(described))
            }
        },
        signal = kill.next() => {
            // Cancels the generator at its next yield.
            join.abort();
            (spawn::signal_code(signal), None, None)
        }
    };

    // The handler task is gone either way; once its channel senders
    // drop, the forwarders drain and finish.
    let _ = forwarder.await;
    let _ = stderr_forwarder.await;
    outcome
}

#[allow(clippy::too_many_arguments)]
async fn run_external(
    program: String,
    args: Vec<String>,
    input: StdinFeed,
    output: SegmentOutput,
    errs: StderrOut,
    cwd: PathBuf,
    env: HashMap<String, String>,
    interactive: bool,
    kill_rx: watch::Receiver<Option<i32>>,
    input_capture: Option<Arc<Mutex<Vec<u8>>>>,
) -> (i32, Option<Error>, Option<String>) {
    let stdin_policy = match (&input, interactive) {
        (_, true) | (StdinFeed::Inherit, _) => StdioPolicy::Inherit,
        (StdinFeed::Empty, _) => StdioPolicy::Null,
        _ => StdioPolicy::Piped,
    };
    let out_policy = if interactive {
        StdioPolicy::Inherit
    } else {
        StdioPolicy::Piped
    };

    let spawned = spawn::spawn(SpawnConfig {
        program: program.clone(),
        args,
        cwd,
        env,
        stdin: stdin_policy,
        stdout: out_policy,
        stderr: out_policy,
    });
    let mut spawned = match spawned {
        Ok(s) => s,
        Err(e) => {
            errs.emit(format!("{}\n", e).into_bytes()).await;
            return (CODE_SPAWN_FAILED, Some(e), None);
        }
    };
    let pgid = spawned.pgid;

    // Stdin pump: feeds the child and captures what was fed.
    let stdin_pump = spawned.child.stdin.take().map(|mut child_stdin| {
        tokio::spawn(async move {
            match input {
                StdinFeed::Bytes(bytes) => {
                    let _ = child_stdin.write_all(&bytes).await;
                }
                StdinFeed::Channel(mut rx) => {
                    while let Some(chunk) = rx.recv().await {
                        if child_stdin.write_all(&chunk).await.is_err() {
                            break;
                        }
                    }
                }
                StdinFeed::Reader(shared) => {
                    let Some(mut reader) = shared.take().await else {
                        return;
                    };
                    let mut buf = vec![0u8; READ_CHUNK];
                    loop {
                        match reader.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                let chunk = &buf[..n];
                                if let Some(capture) = &input_capture {
                                    capture.lock().unwrap().extend_from_slice(chunk);
                                }
                                if child_stdin.write_all(chunk).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
                StdinFeed::Empty | StdinFeed::Inherit => {}
            }
            // child_stdin drops here, closing the pipe.
        })
    });

    // Stdout pump: to the sink when last, otherwise to the next stage.
    let stdout_pump = spawned.child.stdout.take().map(|mut child_stdout| {
        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match child_stdout.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let chunk = buf[..n].to_vec();
                        let delivered = match &output {
                            SegmentOutput::Channel(tx) => tx.send(chunk).await.is_ok(),
                            SegmentOutput::Sink(sink) => {
                                sink.send(ChunkEvent::stdout(chunk)).await.is_ok()
                            }
                        };
                        if !delivered {
                            // Downstream is gone; stop the producer the
                            // way SIGPIPE would.
                            if let Some(pgid) = pgid {
                                spawn::kill_group(pgid, spawn::SIGTERM);
                            }
                            break;
                        }
                    }
                }
            }
        })
    });

    let stderr_pump = spawned.child.stderr.take().map(|mut child_stderr| {
        let errs = errs.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match child_stderr.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => errs.emit(buf[..n].to_vec()).await,
                }
            }
        })
    });

    let mut kill = KillSignal::new(kill_rx);
    let status = loop {
        let signal = tokio::select! {
            status = spawned.child.wait() => break status,
            signal = kill.next() => signal,
        };
        match pgid {
            Some(pgid) => spawn::kill_group(pgid, signal),
            None => {
                let _ = spawned.child.start_kill();
            }
        }
    };

    // Flush remaining output before reporting the exit.
    if let Some(pump) = stdout_pump {
        let _ = pump.await;
    }
    if let Some(pump) = stderr_pump {
        let _ = pump.await;
    }
    // The stdin pump may be blocked on a reader that never ends; the
    // child is gone, so abandon it.
    if let Some(pump) = stdin_pump {
        pump.abort();
    }
    if let Some(pgid) = pgid {
        crate::cleanup::untrack_group(pgid);
    }

    let code = match status {
        Ok(status) => spawn::exit_code(status),
        Err(_) => 1,
    };
    (code, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_options() -> RunOptions {
        RunOptions {
            mirror: false,
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_plan_exec_is_always_external() {
        let plan = build_plan(
            &CommandSpec::Exec {
                program: "echo".to_string(),
                args: vec!["hi".to_string()],
            },
            &quiet_options(),
        )
        .unwrap();
        match plan {
            ExecutionPlan::Stages(stages) => {
                assert_eq!(stages.len(), 1);
                assert!(matches!(stages[0], StagePlan::External { .. }));
            }
            ExecutionPlan::ShellPassthrough(_) => panic!("expected stages"),
        }
    }

    #[test]
    fn test_plan_simple_virtual() {
        let _guard = crate::test_util::lock_global();
        let plan = build_plan(
            &CommandSpec::Shell("echo hi".to_string()),
            &quiet_options(),
        )
        .unwrap();
        match plan {
            ExecutionPlan::Stages(stages) => {
                assert!(matches!(stages[0], StagePlan::Virtual { .. }));
            }
            ExecutionPlan::ShellPassthrough(_) => panic!("expected stages"),
        }
    }

    #[test]
    fn test_plan_operators_need_shell() {
        let plan = build_plan(
            &CommandSpec::Shell("echo a && echo b".to_string()),
            &quiet_options(),
        )
        .unwrap();
        assert!(matches!(plan, ExecutionPlan::ShellPassthrough(_)));
    }

    #[test]
    fn test_plan_operator_free_mode() {
        let options = RunOptions {
            shell_operators: false,
            ..quiet_options()
        };
        let plan = build_plan(&CommandSpec::Shell("x a && b".to_string()), &options).unwrap();
        match plan {
            ExecutionPlan::Stages(stages) => match &stages[0] {
                StagePlan::External { program, args } => {
                    assert_eq!(program, "x");
                    assert_eq!(args, &["a", "&&", "b"]);
                }
                StagePlan::Virtual { .. } => panic!("expected external"),
            },
            ExecutionPlan::ShellPassthrough(_) => panic!("expected stages"),
        }
    }

    #[test]
    fn test_segments_coalesce_externals() {
        let stages = vec![
            StagePlan::External {
                program: "a".to_string(),
                args: vec![],
            },
            StagePlan::External {
                program: "b".to_string(),
                args: vec!["x y".to_string()],
            },
        ];
        let segments = build_segments(stages, false);
        assert_eq!(segments.len(), 1);
        match &segments[0] {
            Segment::External { args, .. } => {
                assert_eq!(args.last().unwrap(), "a | b 'x y'");
            }
            Segment::Virtual { .. } => panic!("expected external"),
        }
    }

    #[test]
    fn test_segments_stay_split_under_pipefail() {
        let stages = vec![
            StagePlan::External {
                program: "a".to_string(),
                args: vec![],
            },
            StagePlan::External {
                program: "b".to_string(),
                args: vec![],
            },
        ];
        let segments = build_segments(stages, true);
        assert_eq!(segments.len(), 2);
    }
}
