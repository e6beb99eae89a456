//! Scanner activity tracing with pluggable backends.
//!
//! The scanning engine reports every externally observable action (column
//! drives, detect mode switches, confirmed key changes) as a small binary
//! *record*. This crate carries the records from the instrumented component
//! to a backend: a [`Write`]-based line formatter for interactive use, or an
//! in-memory [`RecordingBackend`] that tests inspect after the fact.
//!
//! The instrumented component never sees the backend directly; it is handed
//! an opaque [`TraceHook`] closure obtained from a [`TracerHandle`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Maximum payload length for a single record.
const DEFAULT_MAX_RECORD_LEN: usize = 64;

/// Configuration for the tracer.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub max_record_len: usize,
    pub include_timestamp: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_record_len: DEFAULT_MAX_RECORD_LEN,
            include_timestamp: true,
        }
    }
}

/// A single trace record.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub seq: u8,
    pub record_type: u8,
    pub timestamp: Option<Duration>,
    pub payload: Vec<u8>,
}

/// Errors that can occur while emitting trace data.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("backend error: {0}")]
    Backend(#[from] io::Error),
}

/// Backend trait that consumes finished records.
pub trait TraceBackend: Send + Sync {
    fn write_record(&self, record: &TraceRecord) -> Result<(), TraceError>;
}

/// Backend that formats records as text lines into any `Write` implementation.
pub struct WriterBackend<W: Write + Send + Sync + 'static> {
    writer: Arc<Mutex<W>>,
}

impl<W: Write + Send + Sync + 'static> WriterBackend<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

impl<W: Write + Send + Sync + 'static> TraceBackend for WriterBackend<W> {
    fn write_record(&self, record: &TraceRecord) -> Result<(), TraceError> {
        let mut guard = self.writer.lock().unwrap();
        match record.timestamp {
            Some(ts) => writeln!(
                guard,
                "#{:03} rec={} t={}us payload={:02x?}",
                record.seq,
                record.record_type,
                ts.as_micros(),
                record.payload
            )?,
            None => writeln!(
                guard,
                "#{:03} rec={} payload={:02x?}",
                record.seq, record.record_type, record.payload
            )?,
        }
        Ok(())
    }
}

/// Backend that keeps every record in memory for later inspection.
///
/// Cloning shares the underlying buffer, so a test can keep one clone and
/// hand the other to a [`Tracer`].
#[derive(Clone, Default)]
pub struct RecordingBackend {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record captured so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Records of one type, in capture order.
    pub fn records_of(&self, record_type: u8) -> Vec<TraceRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect()
    }

    /// The most recent record of one type.
    pub fn last_of(&self, record_type: u8) -> Option<TraceRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.record_type == record_type)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl TraceBackend for RecordingBackend {
    fn write_record(&self, record: &TraceRecord) -> Result<(), TraceError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Record assembler: sequence numbering and epoch-relative timestamps.
#[derive(Debug)]
pub struct Tracer<B: TraceBackend> {
    backend: B,
    cfg: TraceConfig,
    seq: u8,
    epoch: Instant,
}

#[derive(Clone)]
pub struct TracerHandle<B: TraceBackend> {
    inner: Arc<Mutex<Tracer<B>>>,
}

impl<B: TraceBackend> Tracer<B> {
    pub fn new(cfg: TraceConfig, backend: B) -> Self {
        Self {
            backend,
            cfg,
            seq: 0,
            epoch: Instant::now(),
        }
    }

    pub fn into_handle(self) -> TracerHandle<B> {
        TracerHandle {
            inner: Arc::new(Mutex::new(self)),
        }
    }

    pub fn record(
        &mut self,
        record_type: u8,
        payload: &[u8],
        with_timestamp: bool,
    ) -> Result<TraceRecord, TraceError> {
        if payload.len() > self.cfg.max_record_len {
            return Err(TraceError::PayloadTooLarge(payload.len()));
        }

        let timestamp = if self.cfg.include_timestamp && with_timestamp {
            Some(self.epoch.elapsed())
        } else {
            None
        };

        self.seq = self.seq.wrapping_add(1);
        let record = TraceRecord {
            seq: self.seq,
            record_type,
            timestamp,
            payload: payload.to_vec(),
        };

        self.backend.write_record(&record)?;
        Ok(record)
    }
}

impl<B: TraceBackend + 'static> TracerHandle<B> {
    pub fn emit(&self, record_type: u8, payload: &[u8]) -> Result<TraceRecord, TraceError> {
        self.emit_internal(record_type, payload, false)
    }

    pub fn emit_with_timestamp(
        &self,
        record_type: u8,
        payload: &[u8],
    ) -> Result<TraceRecord, TraceError> {
        self.emit_internal(record_type, payload, true)
    }

    fn emit_internal(
        &self,
        record_type: u8,
        payload: &[u8],
        with_timestamp: bool,
    ) -> Result<TraceRecord, TraceError> {
        let mut guard = self.inner.lock().unwrap();
        guard.record(record_type, payload, with_timestamp)
    }

    /// Opaque emit closure handed to the instrumented component.
    pub fn hook(&self) -> TraceHook {
        let inner = Arc::clone(&self.inner);
        Arc::new(move |record_type, payload, with_timestamp| {
            let mut guard = inner.lock().unwrap();
            guard
                .record(record_type, payload, with_timestamp)
                .map(|_| ())
        })
    }
}

pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> Result<(), TraceError> + Send + Sync>;

/// Convenience backend that writes record lines to stdout.
pub fn stdout_backend() -> WriterBackend<io::Stdout> {
    WriterBackend::new(io::stdout())
}
