//! Run Options
//!
//! Per-run configuration record. Unknown behavior cannot be smuggled in:
//! the fields below are the complete set.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;

/// A boxed async reader handed over as a stdin source.
pub type StdinReader = Box<dyn AsyncRead + Send + Unpin>;

/// Shareable wrapper so options stay cloneable; the first consumer takes
/// the reader, later takers see it already claimed.
#[derive(Clone)]
pub struct SharedReader {
    inner: Arc<tokio::sync::Mutex<Option<StdinReader>>>,
}

impl SharedReader {
    pub fn new(reader: StdinReader) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(Some(reader))),
        }
    }

    pub(crate) async fn take(&self) -> Option<StdinReader> {
        self.inner.lock().await.take()
    }
}

impl fmt::Debug for SharedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedReader")
    }
}

/// Where a child's stdin comes from.
#[derive(Debug, Clone, Default)]
pub enum StdinSource {
    /// Inherit the host's stdin.
    #[default]
    Inherit,
    /// No input; the child sees immediate EOF.
    Ignore,
    /// A fixed byte string fed to the child and then closed.
    Bytes(Vec<u8>),
    /// An async reader pumped into the child.
    Reader(SharedReader),
}

impl StdinSource {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        StdinSource::Bytes(data.into())
    }

    pub fn reader(reader: StdinReader) -> Self {
        StdinSource::Reader(SharedReader::new(reader))
    }
}

impl From<&str> for StdinSource {
    fn from(value: &str) -> Self {
        StdinSource::Bytes(value.as_bytes().to_vec())
    }
}

impl From<String> for StdinSource {
    fn from(value: String) -> Self {
        StdinSource::Bytes(value.into_bytes())
    }
}

impl From<Vec<u8>> for StdinSource {
    fn from(value: Vec<u8>) -> Self {
        StdinSource::Bytes(value)
    }
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Copy child stdout/stderr to the host's streams as chunks arrive.
    pub mirror: bool,
    /// Accumulate child stdout/stderr/stdin for the final result.
    pub capture: bool,
    /// Stdin wiring for the first stage.
    pub stdin: StdinSource,
    /// Working directory; `None` inherits the process cwd.
    pub cwd: Option<PathBuf>,
    /// Environment; `None` inherits the process environment.
    pub env: Option<HashMap<String, String>>,
    /// Attach the child directly to the host terminal.
    pub interactive: bool,
    /// When false, shell metacharacters are ordinary argument bytes and
    /// the whole string is a single program invocation.
    pub shell_operators: bool,
    /// Kill the run after this long.
    pub timeout: Option<Duration>,
    /// Per-run opt-out of diagnostic tracing.
    pub trace: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mirror: true,
            capture: true,
            stdin: StdinSource::default(),
            cwd: None,
            env: None,
            interactive: false,
            shell_operators: true,
            timeout: None,
            trace: true,
        }
    }
}

impl RunOptions {
    /// Defaults for programmatic use: capture without echoing to the
    /// host's streams.
    pub fn quiet() -> Self {
        Self {
            mirror: false,
            ..Self::default()
        }
    }

    /// Effective working directory for this run.
    pub(crate) fn resolve_cwd(&self) -> PathBuf {
        self.cwd
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Effective environment for this run.
    pub(crate) fn resolve_env(&self) -> HashMap<String, String> {
        self.env
            .clone()
            .unwrap_or_else(|| std::env::vars().collect())
    }
}
