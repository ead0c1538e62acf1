//! Append-only protection event log.
//!
//! Entries are prepended (most recent first) and never mutated. The log is a
//! bounded ring: once `capacity` is reached the oldest entry is evicted from
//! memory. Every append is also broadcast to live subscribers and, when a
//! persistence path is configured, written as one JSON line.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::events::types::{EventKind, ProtectionEvent};
use crate::observability::metrics;

/// Capacity of the live broadcast feed; slow subscribers observe `Lagged`.
const FEED_CAPACITY: usize = 256;

struct Inner {
    entries: VecDeque<Arc<ProtectionEvent>>,
    sink: Option<BufWriter<File>>,
}

/// Shared handle to the session's event log. Cloning shares the log.
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
    feed: broadcast::Sender<Arc<ProtectionEvent>>,
}

impl EventLog {
    /// In-memory log holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                sink: None,
            })),
            capacity: capacity.max(1),
            feed,
        }
    }

    /// Log that also appends every event to a JSON-lines file.
    pub fn with_persistence(capacity: usize, path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let log = Self::new(capacity);
        if let Ok(mut inner) = log.inner.lock() {
            inner.sink = Some(BufWriter::new(file));
        }
        tracing::info!(path = %path.display(), "Event log persistence enabled");
        Ok(log)
    }

    /// Create and prepend an event.
    pub fn append(
        &self,
        kind: EventKind,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Arc<ProtectionEvent> {
        let event = Arc::new(ProtectionEvent::new(kind, message, payload));
        self.push(event.clone());
        event
    }

    fn push(&self, event: Arc<ProtectionEvent>) {
        // Hold the lock across the broadcast so subscribers see log order.
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        inner.entries.push_front(event.clone());
        while inner.entries.len() > self.capacity {
            inner.entries.pop_back();
        }

        if let Some(sink) = inner.sink.as_mut() {
            if let Err(e) = write_line(sink, &event) {
                tracing::error!(error = %e, "Failed to persist protection event");
            }
        }

        tracing::info!(kind = %event.kind, message = %event.message, "Protection event");
        metrics::record_protection_event(event.kind.as_str());

        // No subscribers is fine.
        let _ = self.feed.send(event);
    }

    /// All retained events, most recent first.
    pub fn snapshot(&self) -> Vec<Arc<ProtectionEvent>> {
        match self.inner.lock() {
            Ok(inner) => inner.entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().entries.iter().cloned().collect(),
        }
    }

    /// Most recent event, if any.
    pub fn latest(&self) -> Option<Arc<ProtectionEvent>> {
        self.snapshot().into_iter().next()
    }

    /// Retained events of one kind, most recent first.
    pub fn of_kind(&self, kind: EventKind) -> Vec<Arc<ProtectionEvent>> {
        self.snapshot().into_iter().filter(|e| e.kind == kind).collect()
    }

    /// Live feed of events appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ProtectionEvent>> {
        self.feed.subscribe()
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.entries.len(),
            Err(poisoned) => poisoned.into_inner().entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn write_line(sink: &mut BufWriter<File>, event: &ProtectionEvent) -> std::io::Result<()> {
    serde_json::to_writer(&mut *sink, event)?;
    sink.write_all(b"\n")?;
    sink.flush()
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(512)
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
