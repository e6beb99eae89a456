//! Key event encoding and delivery sinks.
//!
//! Confirmed transitions leave the engine as a fixed three-field encoding:
//! a column report, a row report, then the key state report carrying the
//! synchronization marker. Sinks that want logical events reassemble them
//! with [`KeyEventCollector`].

use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field codes of the three-field event encoding.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// Column position.
    X,
    /// Row position.
    Y,
    /// Key state: 1 pressed, 0 released.
    Touch,
}

/// One field report. `sync` terminates the event it belongs to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub code: Code,
    pub value: u16,
    pub sync: bool,
}

/// A confirmed key transition.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
}

/// Receives field reports from the scanner.
///
/// Implementations must not block; there is no acknowledgment or
/// backpressure on this boundary.
pub trait EventSink: Send {
    fn report(&mut self, report: Report);
}

/// Emits one confirmed transition as its three-field encoding.
///
/// This is the whole event emitter: a stateless mapping from a
/// transition to an ordered report triple.
pub fn emit(sink: &mut dyn EventSink, event: KeyEvent) {
    sink.report(Report {
        code: Code::X,
        value: event.col as u16,
        sync: false,
    });
    sink.report(Report {
        code: Code::Y,
        value: event.row as u16,
        sync: false,
    });
    sink.report(Report {
        code: Code::Touch,
        value: event.pressed as u16,
        sync: true,
    });
}

#[derive(Debug, Default)]
struct CollectorInner {
    pending_col: Option<u16>,
    pending_row: Option<u16>,
    events: Vec<KeyEvent>,
}

/// Sink that reassembles report triples into [`KeyEvent`]s.
///
/// Cloning shares the underlying buffer, so a caller can keep one clone
/// and hand the other to the scanner.
#[derive(Debug, Clone, Default)]
pub struct KeyEventCollector {
    inner: Arc<Mutex<CollectorInner>>,
}

impl KeyEventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events collected so far.
    pub fn events(&self) -> Vec<KeyEvent> {
        self.inner.lock().events.clone()
    }

    /// Drains and returns the collected events.
    pub fn take(&self) -> Vec<KeyEvent> {
        std::mem::take(&mut self.inner.lock().events)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }
}

impl EventSink for KeyEventCollector {
    fn report(&mut self, report: Report) {
        let mut inner = self.inner.lock();
        match report.code {
            Code::X => inner.pending_col = Some(report.value),
            Code::Y => inner.pending_row = Some(report.value),
            Code::Touch => {
                if let (Some(col), Some(row)) = (inner.pending_col, inner.pending_row) {
                    inner.events.push(KeyEvent {
                        row: row as u8,
                        col: col as u8,
                        pressed: report.value != 0,
                    });
                }
            }
        }
        if report.sync {
            inner.pending_col = None;
            inner.pending_row = None;
        }
    }
}
