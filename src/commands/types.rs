//! Virtual Command Types
//!
//! A virtual command substitutes for an external program of the same
//! name. A handler is either *batched* (all input up front, one result
//! record back) or *streaming* (incremental input, incremental output,
//! exit code on return); the shape is fixed at registration.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Execution context for a batched command.
pub struct CommandContext {
    pub args: Vec<String>,
    /// Collected stdin bytes.
    pub stdin: Vec<u8>,
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

impl CommandContext {
    /// Stdin as text (lossy).
    pub fn stdin_text(&self) -> String {
        String::from_utf8_lossy(&self.stdin).into_owned()
    }
}

/// Result of a batched command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn error(stderr: String) -> Self {
        Self {
            stdout: String::new(),
            stderr,
            exit_code: 1,
        }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
        }
    }
}

/// Write half of a byte channel handed to streaming commands.
#[derive(Clone)]
pub struct ChunkWriter {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChunkWriter {
    pub(crate) fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Send one chunk downstream. Returns false when the consumer is
    /// gone; producers should stop, like a process hit by SIGPIPE.
    pub async fn write(&self, data: impl Into<Vec<u8>>) -> bool {
        self.tx.send(data.into()).await.is_ok()
    }

    pub async fn write_str(&self, text: &str) -> bool {
        self.write(text.as_bytes().to_vec()).await
    }
}

/// Read half of a byte channel handed to streaming commands.
pub struct ByteReceiver {
    rx: Option<mpsc::Receiver<Vec<u8>>>,
}

impl ByteReceiver {
    pub(crate) fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A receiver that is already at EOF.
    pub(crate) fn empty() -> Self {
        Self { rx: None }
    }

    /// Next chunk of input, or `None` at EOF.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Drain all input into one buffer.
    pub async fn collect(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

/// Execution context for a streaming command.
pub struct StreamContext {
    pub args: Vec<String>,
    /// Incremental stdin; yields `None` at EOF.
    pub input: ByteReceiver,
    pub stdout: ChunkWriter,
    pub stderr: ChunkWriter,
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

/// A batched command: receives all input, returns one result record.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;
    async fn execute(&self, ctx: CommandContext) -> CommandResult;
}

/// A streaming command: consumes and produces chunks incrementally and
/// returns its exit code (0 for success).
#[async_trait]
pub trait StreamingCommand: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, ctx: StreamContext) -> i32;
}

/// A registered handler, tagged with its invocation shape.
#[derive(Clone)]
pub enum Handler {
    Batched(Arc<dyn Command>),
    Streaming(Arc<dyn StreamingCommand>),
}

type BoxedBatched = Box<
    dyn Fn(CommandContext) -> Pin<Box<dyn Future<Output = CommandResult> + Send>> + Send + Sync,
>;
type BoxedStreaming =
    Box<dyn Fn(StreamContext) -> Pin<Box<dyn Future<Output = i32> + Send>> + Send + Sync>;

struct FnCommand {
    f: BoxedBatched,
}

#[async_trait]
impl Command for FnCommand {
    fn name(&self) -> &str {
        "anonymous"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        (self.f)(ctx).await
    }
}

struct FnStreamingCommand {
    f: BoxedStreaming,
}

#[async_trait]
impl StreamingCommand for FnStreamingCommand {
    fn name(&self) -> &str {
        "anonymous"
    }

    async fn run(&self, ctx: StreamContext) -> i32 {
        (self.f)(ctx).await
    }
}

impl Handler {
    /// Wrap an async closure as a batched handler.
    pub fn batched_fn<F, Fut>(f: F) -> Handler
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        Handler::Batched(Arc::new(FnCommand {
            f: Box::new(move |ctx| Box::pin(f(ctx))),
        }))
    }

    /// Wrap an async closure as a streaming handler.
    pub fn streaming_fn<F, Fut>(f: F) -> Handler
    where
        F: Fn(StreamContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = i32> + Send + 'static,
    {
        Handler::Streaming(Arc::new(FnStreamingCommand {
            f: Box::new(move |ctx| Box::pin(f(ctx))),
        }))
    }
}

#[cfg(test)]
pub(crate) fn test_context(args: Vec<&str>, stdin: &str) -> CommandContext {
    CommandContext {
        args: args.into_iter().map(String::from).collect(),
        stdin: stdin.as_bytes().to_vec(),
        cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        env: std::env::vars().collect(),
    }
}
