//! Poll loop and scan state machine.
//!
//! The scanner owns the sweep: while `Polling` it energizes each column
//! in turn, assembles the sample, and hands it to the debounce filter.
//! When a sweep ends with no pressed keys and no running timers it arms
//! the backend's wake-detect configuration and goes `Idle` until an
//! external trigger calls [`Scanner::start`] again.

use std::thread;
use std::time::Instant;

use ktrace::TraceHook;
use log::{debug, trace};

use crate::config::{ConfigError, MatrixConfig};
use crate::debounce::DebounceFilter;
use crate::driver::{ColumnDrive, MatrixBackend, RowMask};
use crate::event::{self, EventSink, KeyEvent};
use crate::mask::{KeyMask, KeyMaskHandle, OutOfBounds};

/// Trace record: column energized or released; payload `[selector]`.
pub const REC_COLUMN_DRIVE: u8 = 1;
/// Trace record: detect mode switched; payload `[enabled]`.
pub const REC_DETECT_MODE: u8 = 2;
/// Trace record: scan state changed; payload `[state]`.
pub const REC_SCAN_STATE: u8 = 3;
/// Trace record: confirmed key change; payload `[row, col, pressed]`.
pub const REC_KEY_CHANGE: u8 = 4;

/// Column selector payload byte for [`ColumnDrive::None`].
pub const DRIVE_NONE_BYTE: u8 = 0xFF;
/// Column selector payload byte for [`ColumnDrive::All`].
pub const DRIVE_ALL_BYTE: u8 = 0xFE;

fn drive_byte(drive: ColumnDrive) -> u8 {
    match drive {
        ColumnDrive::None => DRIVE_NONE_BYTE,
        ColumnDrive::All => DRIVE_ALL_BYTE,
        ColumnDrive::Single(col) => col,
    }
}

/// Process-wide scan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Detect mode armed, waiting for an external start trigger.
    Idle,
    /// Actively sweeping the matrix every poll period.
    Polling,
}

/// The keyboard matrix scanner.
///
/// Assembled through [`Scanner::builder`]; driven either by calling
/// [`Scanner::tick`] from a timer callback or by [`Scanner::run_until_idle`]
/// on a dedicated thread.
pub struct Scanner<B: MatrixBackend> {
    config: MatrixConfig,
    backend: B,
    sink: Box<dyn EventSink>,
    filter: DebounceFilter,
    mask: KeyMaskHandle,
    state: ScanState,
    sample: Vec<RowMask>,
    transitions: Vec<KeyEvent>,
    last_activity: Option<Instant>,
    trace: Option<TraceHook>,
}

impl<B: MatrixBackend> std::fmt::Debug for Scanner<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Builder for scanner assembly.
pub struct ScannerBuilder<B: MatrixBackend> {
    config: MatrixConfig,
    backend: B,
    sink: Box<dyn EventSink>,
    mask: Option<KeyMask>,
    trace: Option<TraceHook>,
}

impl<B: MatrixBackend> ScannerBuilder<B> {
    pub fn new(config: MatrixConfig, backend: B, sink: Box<dyn EventSink>) -> Self {
        Self {
            config,
            backend,
            sink,
            mask: None,
            trace: None,
        }
    }

    /// Seeds the wired-key mask.
    pub fn with_mask(mut self, mask: KeyMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Installs the observer hook for scanner activity.
    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn build(self) -> Result<Scanner<B>, ConfigError> {
        let config = self.config;
        let mask = match self.mask {
            Some(mask) => {
                if mask.row_count() != config.row_count || mask.col_count() != config.col_count {
                    return Err(ConfigError::MaskShape {
                        rows: config.row_count,
                        cols: config.col_count,
                        got_rows: mask.row_count(),
                        got_cols: mask.col_count(),
                    });
                }
                mask
            }
            None => KeyMask::new(config.row_count, config.col_count),
        };

        Ok(Scanner::assemble(
            config,
            self.backend,
            self.sink,
            mask,
            self.trace,
        ))
    }
}

impl<B: MatrixBackend> Scanner<B> {
    pub fn builder(config: MatrixConfig, backend: B, sink: Box<dyn EventSink>) -> ScannerBuilder<B> {
        ScannerBuilder::new(config, backend, sink)
    }

    /// Scanner with a default (all-unwired) mask and no observer.
    pub fn new(config: MatrixConfig, backend: B, sink: Box<dyn EventSink>) -> Self {
        let mask = KeyMask::new(config.row_count, config.col_count);
        Self::assemble(config, backend, sink, mask, None)
    }

    fn assemble(
        config: MatrixConfig,
        backend: B,
        sink: Box<dyn EventSink>,
        mask: KeyMask,
        trace: Option<TraceHook>,
    ) -> Self {
        let filter = DebounceFilter::new(&config);
        let sample = vec![RowMask::EMPTY; config.col_count as usize];
        let mut scanner = Self {
            config,
            backend,
            sink,
            filter,
            mask: KeyMaskHandle::new(mask),
            state: ScanState::Idle,
            sample,
            transitions: Vec::new(),
            last_activity: None,
            trace,
        };
        scanner.enter_idle();
        scanner
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Handle for mutating the wired-key mask while the scanner runs.
    pub fn mask_handle(&self) -> KeyMaskHandle {
        self.mask.clone()
    }

    /// Marks one key of the wired-key mask, bounds-checked.
    ///
    /// Takes effect on the next sample.
    pub fn set_actual_key_mask(&self, row: u8, col: u8, present: bool) -> Result<(), OutOfBounds> {
        self.mask.set(row, col, present)
    }

    /// Forces the transition from `Idle` to `Polling`.
    ///
    /// Called on an external start trigger: a wake interrupt or an
    /// explicit resume. Idempotent while already polling.
    pub fn start(&mut self) {
        if self.state == ScanState::Polling {
            return;
        }
        self.backend.set_detect_mode(false);
        self.emit_record(REC_DETECT_MODE, &[0], true);
        self.drive(ColumnDrive::None);
        self.last_activity = None;
        self.set_state(ScanState::Polling);
    }

    /// Forces the transition to `Idle`.
    ///
    /// Running debounce timers are discarded without emitting events, as
    /// if the unconfirmed transitions never happened. Idempotent while
    /// already idle.
    pub fn stop(&mut self) {
        if self.state == ScanState::Idle {
            return;
        }
        self.filter.reset_pending();
        self.enter_idle();
    }

    /// Runs one poll iteration at `now`. No-op while `Idle`.
    pub fn tick(&mut self, now: Instant) -> ScanState {
        if self.state == ScanState::Idle {
            return self.state;
        }

        for col in 0..self.config.col_count {
            self.drive(ColumnDrive::Single(col));
            if !self.config.settle_time.is_zero() {
                thread::sleep(self.config.settle_time);
            }
            self.sample[col as usize] = self.backend.read_row();
        }
        self.drive(ColumnDrive::None);

        let summary = {
            let mask = self.mask.lock();
            self.filter
                .process(&self.sample, &mask, now, &mut self.transitions)
        };

        let mut transitions = std::mem::take(&mut self.transitions);
        for event in transitions.drain(..) {
            debug!(
                "key ({}, {}) {}",
                event.row,
                event.col,
                if event.pressed { "pressed" } else { "released" }
            );
            self.emit_record(
                REC_KEY_CHANGE,
                &[event.row, event.col, event.pressed as u8],
                true,
            );
            event::emit(self.sink.as_mut(), event);
        }
        self.transitions = transitions;

        trace!(
            "sweep done, {} active, {} pending",
            summary.active,
            summary.pending
        );

        if summary.quiet() {
            let last = *self.last_activity.get_or_insert(now);
            let expired = match self.config.poll_timeout {
                None => true,
                Some(timeout) => now.duration_since(last) >= timeout,
            };
            if expired {
                self.enter_idle();
            }
        } else {
            self.last_activity = Some(now);
        }

        self.state
    }

    /// Sweeps at the poll period until the matrix goes quiet.
    ///
    /// Returns once `Idle` is entered; call [`Scanner::start`] to resume
    /// after the next wake trigger.
    pub fn run_until_idle(&mut self) {
        while self.tick(Instant::now()) == ScanState::Polling {
            thread::sleep(self.config.poll_period);
        }
    }

    fn enter_idle(&mut self) {
        self.drive(ColumnDrive::All);
        self.backend.set_detect_mode(true);
        self.emit_record(REC_DETECT_MODE, &[1], true);
        self.last_activity = None;
        self.set_state(ScanState::Idle);
    }

    fn set_state(&mut self, state: ScanState) {
        if self.state != state {
            debug!("scan state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.emit_record(REC_SCAN_STATE, &[state as u8], true);
        }
    }

    fn drive(&mut self, drive: ColumnDrive) {
        self.backend.drive_column(drive);
        self.emit_record(REC_COLUMN_DRIVE, &[drive_byte(drive)], false);
    }

    fn emit_record(&self, record_type: u8, payload: &[u8], with_timestamp: bool) {
        if let Some(hook) = &self.trace {
            let _ = hook(record_type, payload, with_timestamp);
        }
    }
}
