//! Command Runner
//!
//! The mutable core of a run. A `Runner` is created lazily: nothing
//! happens until the first observable access (await, chunk iteration,
//! event subscription, or stream access). From then on it moves through
//! `Created → Started → Finalizing → Finished` exactly once, and every
//! observer sees the same final result.

pub mod types;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::cleanup;
use crate::error::{Error, Result};
use crate::events::{
    ByteStream, ChunkEvent, ChunkStream, Event, EventBus, EventStream, StreamKind,
};
use crate::options::{RunOptions, StdinSource};
use crate::pipeline::{self, ExecContext, StdinFeed};
use crate::spawn::{self, CODE_INTERRUPTED};
use crate::state;
use crate::stream_util::{self, WriteOutcome};
use crate::trace;

pub use types::{CommandSpec, ExecResult, RunnerState};

static NEXT_RUNNER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn reset_runner_ids() {
    NEXT_RUNNER_ID.store(1, Ordering::SeqCst);
}

/// Grace between the soft and hard kill of a timed-out run.
const KILL_GRACE: Duration = Duration::from_millis(200);

const STDIN_PIPE_DEPTH: usize = 32;

#[derive(Default)]
struct StdinPipe {
    rx: Option<mpsc::Receiver<Vec<u8>>>,
    claimed: bool,
}

struct RunnerShared {
    id: u64,
    spec: CommandSpec,
    /// Taken by the runner task at start.
    options: Mutex<Option<RunOptions>>,
    state: Mutex<RunnerState>,
    started: AtomicBool,
    finished: AtomicBool,
    killed: AtomicBool,
    bus: EventBus,
    stdout_capture: Mutex<Vec<u8>>,
    stdin_capture: Arc<Mutex<Vec<u8>>>,
    stdin_pipe: Mutex<StdinPipe>,
    outcome: Mutex<Option<Result<ExecResult>>>,
    done_tx: watch::Sender<bool>,
    kill_tx: watch::Sender<Option<i32>>,
}

/// Kills the child when the last user handle goes away mid-run.
struct DropGuard {
    shared: Arc<RunnerShared>,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if self.shared.started.load(Ordering::SeqCst)
            && !self.shared.finished.load(Ordering::SeqCst)
        {
            self.shared.kill_tx.send_replace(Some(spawn::SIGTERM));
        }
    }
}

/// Handle to one command execution. Cheap to clone; all clones observe
/// the same run.
#[derive(Clone)]
pub struct Runner {
    shared: Arc<RunnerShared>,
    _guard: Arc<DropGuard>,
}

/// Write half of a runner's stdin pipe. Dropping it closes the child's
/// stdin.
pub struct StdinWriter {
    tx: mpsc::Sender<Vec<u8>>,
    capture: Option<Arc<Mutex<Vec<u8>>>>,
}

impl StdinWriter {
    /// Send bytes to the child. Returns false once the child's input has
    /// closed.
    pub async fn write(&self, data: impl Into<Vec<u8>>) -> bool {
        let data = data.into();
        if let Some(capture) = &self.capture {
            capture.lock().unwrap().extend_from_slice(&data);
        }
        self.tx.send(data).await.is_ok()
    }

    pub async fn write_str(&self, text: &str) -> bool {
        self.write(text.as_bytes().to_vec()).await
    }

    /// Close the child's stdin.
    pub fn close(self) {}
}

impl Runner {
    pub(crate) fn new(spec: CommandSpec, options: RunOptions) -> Self {
        let (done_tx, _) = watch::channel(false);
        let (kill_tx, _) = watch::channel(None);
        let shared = Arc::new(RunnerShared {
            id: NEXT_RUNNER_ID.fetch_add(1, Ordering::SeqCst),
            spec,
            options: Mutex::new(Some(options)),
            state: Mutex::new(RunnerState::Created),
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            killed: AtomicBool::new(false),
            bus: EventBus::new(),
            stdout_capture: Mutex::new(Vec::new()),
            stdin_capture: Arc::new(Mutex::new(Vec::new())),
            stdin_pipe: Mutex::new(StdinPipe::default()),
            outcome: Mutex::new(None),
            done_tx,
            kill_tx,
        });
        Runner {
            _guard: Arc::new(DropGuard {
                shared: shared.clone(),
            }),
            shared,
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.shared.spec
    }

    pub fn state(&self) -> RunnerState {
        *self.shared.state.lock().unwrap()
    }

    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::SeqCst)
    }

    pub fn is_killed(&self) -> bool {
        self.shared.killed.load(Ordering::SeqCst)
    }

    fn ensure_started(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.shared.killed.load(Ordering::SeqCst) {
            // Killed before any observable access: resolve without ever
            // spawning anything.
            let options = self
                .shared
                .options
                .lock()
                .unwrap()
                .take()
                .unwrap_or_default();
            finalize(
                &self.shared,
                empty_result(&options, CODE_INTERRUPTED),
                None,
                false,
            );
            return;
        }
        let shared = self.shared.clone();
        tokio::spawn(run_task(shared));
    }

    /// Wait for the final result, starting the run if needed. An error
    /// comes back only for parse failures, spawn failures, timeouts,
    /// interrupts, or a non-zero exit while errexit is set.
    pub async fn wait(&self) -> Result<ExecResult> {
        self.ensure_started();
        let mut done = self.shared.done_tx.subscribe();
        while !*done.borrow() {
            if done.changed().await.is_err() {
                break;
            }
        }
        self.shared
            .outcome
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(ExecResult::default()))
    }

    /// Block the calling thread until the run finishes. Refuses once
    /// async consumption has begun.
    pub fn wait_blocking(&self) -> Result<ExecResult> {
        if self.shared.started.load(Ordering::SeqCst)
            && !self.shared.finished.load(Ordering::SeqCst)
        {
            return Err(Error::AlreadyStarted);
        }
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.wait())
        })
    }

    /// Lazy, finite sequence of output chunks.
    pub fn chunks(&self) -> ChunkStream {
        let rx = self.shared.bus.subscribe();
        self.ensure_started();
        ChunkStream::new(rx)
    }

    /// Subscribe to lifecycle events. After completion only the
    /// terminal `End`/`Exit` events are replayed.
    pub fn subscribe(&self) -> EventStream {
        let rx = self.shared.bus.subscribe();
        self.ensure_started();
        EventStream::new(rx)
    }

    /// Live stdout bytes.
    pub fn stdout_stream(&self) -> ByteStream {
        let rx = self.shared.bus.subscribe();
        self.ensure_started();
        ByteStream::new(rx, StreamKind::Stdout)
    }

    /// Live stderr bytes.
    pub fn stderr_stream(&self) -> ByteStream {
        let rx = self.shared.bus.subscribe();
        self.ensure_started();
        ByteStream::new(rx, StreamKind::Stderr)
    }

    /// Writable stdin handle. Must be claimed before any other
    /// consumption starts the run; claiming it switches stdin to a pipe.
    pub fn stdin_writer(&self) -> Result<StdinWriter> {
        let (tx, capture) = {
            let mut pipe = self.shared.stdin_pipe.lock().unwrap();
            if pipe.claimed {
                return Err(Error::AlreadyStarted);
            }
            if self.shared.started.load(Ordering::SeqCst) {
                return Err(Error::AlreadyStarted);
            }
            let (tx, rx) = mpsc::channel(STDIN_PIPE_DEPTH);
            pipe.rx = Some(rx);
            pipe.claimed = true;
            let capture = self
                .shared
                .options
                .lock()
                .unwrap()
                .as_ref()
                .map(|o| o.capture)
                .unwrap_or(true)
                .then(|| self.shared.stdin_capture.clone());
            (tx, capture)
        };
        self.ensure_started();
        Ok(StdinWriter { tx, capture })
    }

    /// Request termination. Non-blocking; completion is observed via
    /// wait or iteration. Before the first observable access this marks
    /// the runner so it resolves with code 130 without spawning.
    pub fn kill(&self, signal: Option<i32>) {
        let signal = signal.unwrap_or(spawn::SIGTERM);
        self.shared.killed.store(true, Ordering::SeqCst);
        if self.shared.finished.load(Ordering::SeqCst) {
            return;
        }
        if self.shared.started.load(Ordering::SeqCst) {
            self.shared.kill_tx.send_replace(Some(signal));
        }
    }
}

fn empty_result(options: &RunOptions, code: i32) -> ExecResult {
    ExecResult {
        code,
        stdout: options.capture.then(String::new),
        stderr: options.capture.then(String::new),
        stdin: options.capture.then(String::new),
    }
}

fn final_code(codes: &[i32], pipefail: bool) -> i32 {
    if pipefail {
        if let Some(code) = codes.iter().find(|c| **c != 0) {
            return *code;
        }
    }
    codes.last().copied().unwrap_or(0)
}

fn handle_chunk(shared: &Arc<RunnerShared>, options: &RunOptions, chunk: ChunkEvent) {
    if options.capture && chunk.kind == StreamKind::Stdout {
        shared
            .stdout_capture
            .lock()
            .unwrap()
            .extend_from_slice(&chunk.data);
    }
    if options.mirror && !options.interactive {
        let outcome = if stream_util::color_suppressed() {
            stream_util::safe_write(chunk.kind, &stream_util::strip_ansi(&chunk.data))
        } else {
            stream_util::safe_write(chunk.kind, &chunk.data)
        };
        if outcome == WriteOutcome::BrokenPipe {
            // The host's consumer is gone; stop producing, like the head
            // of a real pipeline whose reader exited.
            *shared.state.lock().unwrap() = RunnerState::Finalizing;
            shared.kill_tx.send_replace(Some(spawn::SIGTERM));
        }
    }
    shared.bus.emit(Event::Chunk(chunk));
}

fn finalize(
    shared: &Arc<RunnerShared>,
    result: ExecResult,
    error: Option<Error>,
    deregister: bool,
) {
    *shared.state.lock().unwrap() = RunnerState::Finalizing;
    shared.bus.emit(Event::End(result.clone()));
    shared.bus.emit(Event::Exit(result.code));
    *shared.outcome.lock().unwrap() = Some(match error {
        Some(e) => Err(e),
        None => Ok(result),
    });
    *shared.state.lock().unwrap() = RunnerState::Finished;
    shared.finished.store(true, Ordering::SeqCst);
    if deregister {
        cleanup::deregister_runner(shared.id);
    }
    shared.done_tx.send_replace(true);
}

async fn run_task(shared: Arc<RunnerShared>) {
    let options = shared
        .options
        .lock()
        .unwrap()
        .take()
        .unwrap_or_default();
    let flags = state::flags();
    let display = shared.spec.display();

    if options.trace {
        trace::trace("runner", &format!("start: {}", display));
    }
    if flags.verbose {
        eprintln!("{}", display);
    }
    if flags.xtrace {
        trace::xtrace_line(&display);
    }

    let plan = match pipeline::build_plan(&shared.spec, &options) {
        Ok(plan) => plan,
        Err(e) => {
            *shared.state.lock().unwrap() = RunnerState::Started;
            shared.bus.emit(Event::Start);
            shared.bus.emit(Event::Error(e.to_string()));
            finalize(&shared, empty_result(&options, 2), Some(e), false);
            return;
        }
    };

    cleanup::register_runner(shared.id, shared.kill_tx.clone());
    *shared.state.lock().unwrap() = RunnerState::Started;
    shared.bus.emit(Event::Start);

    let pipe_rx = shared.stdin_pipe.lock().unwrap().rx.take();
    let feed = match pipe_rx {
        Some(rx) => StdinFeed::Channel(rx),
        None => match options.stdin.clone() {
            StdinSource::Inherit => StdinFeed::Inherit,
            StdinSource::Ignore => StdinFeed::Empty,
            StdinSource::Bytes(bytes) => {
                if options.capture {
                    shared
                        .stdin_capture
                        .lock()
                        .unwrap()
                        .extend_from_slice(&bytes);
                }
                StdinFeed::Bytes(bytes)
            }
            StdinSource::Reader(reader) => StdinFeed::Reader(reader),
        },
    };

    let (sink_tx, mut sink_rx) = mpsc::channel::<ChunkEvent>(64);
    let ctx = ExecContext {
        cwd: options.resolve_cwd(),
        env: options.resolve_env(),
        capture: options.capture,
        interactive: options.interactive,
        sink: sink_tx,
        kill_rx: shared.kill_tx.subscribe(),
        input_capture: options.capture.then(|| shared.stdin_capture.clone()),
    };

    let timed_out = Arc::new(AtomicBool::new(false));
    let watchdog = options.timeout.map(|timeout| {
        let kill_tx = shared.kill_tx.clone();
        let timed_out = timed_out.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            timed_out.store(true, Ordering::SeqCst);
            kill_tx.send_replace(Some(spawn::SIGTERM));
            tokio::time::sleep(KILL_GRACE).await;
            kill_tx.send_replace(Some(spawn::SIGKILL));
        })
    });

    let drain = async {
        while let Some(chunk) = sink_rx.recv().await {
            handle_chunk(&shared, &options, chunk);
        }
    };
    let (outcome, ()) = tokio::join!(pipeline::execute(plan, feed, ctx), drain);

    if let Some(watchdog) = watchdog {
        watchdog.abort();
    }

    let code = final_code(&outcome.codes, flags.pipefail);
    let stderr_bytes = outcome.stage_stderr.concat();
    let result = ExecResult {
        code,
        stdout: options.capture.then(|| {
            String::from_utf8_lossy(&shared.stdout_capture.lock().unwrap()).into_owned()
        }),
        stderr: options
            .capture
            .then(|| String::from_utf8_lossy(&stderr_bytes).into_owned()),
        stdin: options.capture.then(|| {
            String::from_utf8_lossy(&shared.stdin_capture.lock().unwrap()).into_owned()
        }),
    };

    let error = if timed_out.load(Ordering::SeqCst) {
        Some(Error::Timeout {
            timeout_ms: options
                .timeout
                .map(|t| t.as_millis() as u64)
                .unwrap_or_default(),
            result: result.clone(),
        })
    } else if let Some(e) = outcome.spawn_error {
        Some(e)
    } else if *shared.kill_tx.subscribe().borrow() == Some(spawn::SIGINT) {
        Some(Error::Interrupted {
            result: result.clone(),
        })
    } else if code != 0 && flags.errexit {
        Some(Error::ExitNonZero {
            code,
            result: result.clone(),
        })
    } else {
        None
    };

    if let Some(message) = outcome.virtual_error {
        shared.bus.emit(Event::Error(message));
    }
    if options.trace {
        trace::trace("runner", &format!("exit {}: {}", code, display));
    }
    finalize(&shared, result, error, true);
}
