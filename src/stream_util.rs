//! Stream Utilities
//!
//! Buffer coercion, broken-pipe-tolerant writes to the host's streams,
//! and ANSI escape filtering for CI-safe mirroring.

use std::io::{self, Write};

use regex_lite::Regex;

use crate::events::StreamKind;

/// Coerce an optional text/byte value to a byte buffer. `None` becomes an
/// empty buffer; text obeys UTF-8.
pub fn as_buffer<B: AsRef<[u8]>>(value: Option<B>) -> Vec<u8> {
    match value {
        Some(v) => v.as_ref().to_vec(),
        None => Vec::new(),
    }
}

/// Outcome of a write to the host's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The downstream consumer is gone; the owning runner should begin
    /// finalizing, like the head of a shell pipeline whose reader exited.
    BrokenPipe,
}

fn write_all(target: &mut dyn Write, data: &[u8]) -> WriteOutcome {
    match target.write_all(data).and_then(|_| target.flush()) {
        Ok(()) => WriteOutcome::Written,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => WriteOutcome::BrokenPipe,
        // Other write errors are swallowed; mirroring is best-effort.
        Err(_) => WriteOutcome::Written,
    }
}

/// Write to the host's matching stream, ignoring broken-pipe errors but
/// reporting them so the caller can stop producing.
pub fn safe_write(kind: StreamKind, data: &[u8]) -> WriteOutcome {
    match kind {
        StreamKind::Stdout => write_all(&mut io::stdout().lock(), data),
        StreamKind::Stderr => write_all(&mut io::stderr().lock(), data),
    }
}

lazy_static::lazy_static! {
    /// CSI and two-byte escape sequences.
    static ref ANSI_ESCAPE: Regex =
        Regex::new("\u{1b}(?:\\[[0-9;?]*[@-~]|[@-Z\\\\-_])").unwrap();
}

/// Strip ANSI escape sequences from a chunk. Invalid UTF-8 passes through
/// untouched; escape sequences are ASCII so text chunks round-trip.
pub fn strip_ansi(data: &[u8]) -> Vec<u8> {
    if !data.contains(&0x1b) {
        return data.to_vec();
    }
    match std::str::from_utf8(data) {
        Ok(text) => ANSI_ESCAPE.replace_all(text, "").into_owned().into_bytes(),
        Err(_) => data.to_vec(),
    }
}

/// True when color output should be suppressed while mirroring.
pub fn color_suppressed() -> bool {
    std::env::var("CI").map(|v| v == "true").unwrap_or(false)
}
