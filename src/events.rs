//! Lifecycle Events
//!
//! A runner emits a closed set of events over per-subscriber channels:
//! `Start`, one `Chunk` per output chunk, then `End` and `Exit` exactly
//! once. Subscribers attached before completion receive everything from
//! their attach point on; subscribers attached after completion receive
//! only the replayable terminal events (`End`, `Exit`).

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::runner::types::ExecResult;

/// Which output stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// One chunk of child output, in arrival order per stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEvent {
    pub kind: StreamKind,
    pub data: Vec<u8>,
}

impl ChunkEvent {
    pub fn stdout(data: Vec<u8>) -> Self {
        Self {
            kind: StreamKind::Stdout,
            data,
        }
    }

    pub fn stderr(data: Vec<u8>) -> Self {
        Self {
            kind: StreamKind::Stderr,
            data,
        }
    }

    /// Chunk payload as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// A runner lifecycle event.
#[derive(Debug, Clone)]
pub enum Event {
    /// The runner started executing.
    Start,
    /// An output chunk arrived.
    Chunk(ChunkEvent),
    /// All output has been emitted; carries the final result.
    End(ExecResult),
    /// Terminal event, emitted last.
    Exit(i32),
    /// A non-result failure (parse, spawn, handler panic).
    Error(String),
}

struct BusInner {
    subscribers: Vec<mpsc::UnboundedSender<Event>>,
    /// Replayed to late subscribers: `End` then `Exit`.
    terminal: Vec<Event>,
    closed: bool,
}

/// Fan-out of events to any number of subscribers, preserving emission
/// order per subscriber.
pub(crate) struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                subscribers: Vec::new(),
                terminal: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn emit(&self, event: Event) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }
        if matches!(event, Event::End(_) | Event::Exit(_)) {
            inner.terminal.push(event.clone());
        }
        inner
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
        if matches!(event, Event::Exit(_)) {
            inner.closed = true;
            // Dropping the senders ends every subscriber stream after it
            // drains its queue.
            inner.subscribers.clear();
        }
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            for event in &inner.terminal {
                let _ = tx.send(event.clone());
            }
            // Sender drops here; the stream yields the terminal events
            // and then ends.
        } else {
            inner.subscribers.push(tx);
        }
        rx
    }
}

/// Async sequence of all events of one runner.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { rx }
    }

    /// Next event, or `None` after `Exit`.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Async sequence of output chunks of one runner. Finite and
/// non-restartable; ends after the runner's streams close.
pub struct ChunkStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl ChunkStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { rx }
    }

    /// Next output chunk, or `None` once the runner has ended.
    pub async fn next(&mut self) -> Option<ChunkEvent> {
        loop {
            match self.rx.recv().await {
                Some(Event::Chunk(chunk)) => return Some(chunk),
                Some(_) => continue,
                None => return None,
            }
        }
    }
}

/// Async sequence of bytes from one output stream of a runner.
pub struct ByteStream {
    rx: mpsc::UnboundedReceiver<Event>,
    kind: StreamKind,
}

impl ByteStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event>, kind: StreamKind) -> Self {
        Self { rx, kind }
    }

    /// Next chunk of bytes, or `None` once the stream has closed.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Some(Event::Chunk(chunk)) if chunk.kind == self.kind => return Some(chunk.data),
                Some(_) => continue,
                None => return None,
            }
        }
    }

    /// Drain the stream to a single buffer.
    pub async fn collect(mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_sees_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(Event::Start);
        bus.emit(Event::Chunk(ChunkEvent::stdout(b"hi".to_vec())));
        bus.emit(Event::End(ExecResult::empty(0)));
        bus.emit(Event::Exit(0));

        assert!(matches!(rx.recv().await, Some(Event::Start)));
        assert!(matches!(rx.recv().await, Some(Event::Chunk(_))));
        assert!(matches!(rx.recv().await, Some(Event::End(_))));
        assert!(matches!(rx.recv().await, Some(Event::Exit(0))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_terminal_replay_only() {
        let bus = EventBus::new();
        bus.emit(Event::Start);
        bus.emit(Event::Chunk(ChunkEvent::stdout(b"dropped".to_vec())));
        bus.emit(Event::End(ExecResult::empty(7)));
        bus.emit(Event::Exit(7));

        let mut rx = bus.subscribe();
        match rx.recv().await {
            Some(Event::End(result)) => assert_eq!(result.code, 7),
            other => panic!("expected End, got {:?}", other),
        }
        assert!(matches!(rx.recv().await, Some(Event::Exit(7))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_emit_after_exit_is_dropped() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(Event::Exit(0));
        bus.emit(Event::Start);
        assert!(matches!(rx.recv().await, Some(Event::Exit(0))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_chunk_stream_filters_and_ends() {
        let bus = EventBus::new();
        let mut chunks = ChunkStream::new(bus.subscribe());

        bus.emit(Event::Start);
        bus.emit(Event::Chunk(ChunkEvent::stdout(b"a".to_vec())));
        bus.emit(Event::Chunk(ChunkEvent::stderr(b"b".to_vec())));
        bus.emit(Event::End(ExecResult::empty(0)));
        bus.emit(Event::Exit(0));

        assert_eq!(chunks.next().await.unwrap().data, b"a");
        assert_eq!(chunks.next().await.unwrap().data, b"b");
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_byte_stream_single_kind() {
        let bus = EventBus::new();
        let stream = ByteStream::new(bus.subscribe(), StreamKind::Stdout);

        bus.emit(Event::Chunk(ChunkEvent::stdout(b"1".to_vec())));
        bus.emit(Event::Chunk(ChunkEvent::stderr(b"x".to_vec())));
        bus.emit(Event::Chunk(ChunkEvent::stdout(b"2".to_vec())));
        bus.emit(Event::Exit(0));

        assert_eq!(stream.collect().await, b"12");
    }
}
