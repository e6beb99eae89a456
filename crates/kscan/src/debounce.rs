//! Debounce and ghost filtering.
//!
//! Converts raw per-column samples into confirmed key states with
//! hysteresis. A transition is confirmed only after its raw value has
//! persisted for the direction-appropriate duration; any level reversal
//! before that restarts the wait, so a sufficiently bouncy line delays
//! confirmation indefinitely. That is accepted behavior.

use std::time::{Duration, Instant};

use log::trace;

use crate::config::MatrixConfig;
use crate::driver::RowMask;
use crate::event::KeyEvent;
use crate::ghost::GhostPredicate;
use crate::mask::KeyMask;

#[derive(Debug, Default, Clone, Copy)]
struct KeyState {
    confirmed: bool,
    pending_since: Option<Instant>,
}

/// Per-sweep filter summary used for the idle decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    /// Keys currently confirmed pressed.
    pub active: usize,
    /// Keys with a running debounce timer.
    pub pending: usize,
}

impl FilterSummary {
    /// No pressed keys and no timers: the matrix can go to sleep.
    pub fn quiet(&self) -> bool {
        self.active == 0 && self.pending == 0
    }
}

/// Owns per-key state and interprets raw scan samples.
pub struct DebounceFilter {
    rows: u8,
    cols: u8,
    debounce_down: Duration,
    debounce_up: Duration,
    ghost_check: bool,
    predicate: GhostPredicate,
    // Column-major, index = col * rows + row, matching scan order.
    keys: Vec<KeyState>,
}

impl DebounceFilter {
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            rows: config.row_count,
            cols: config.col_count,
            debounce_down: config.debounce_down,
            debounce_up: config.debounce_up,
            ghost_check: config.ghost_check,
            predicate: config.ghost_predicate,
            keys: vec![KeyState::default(); config.key_count()],
        }
    }

    /// Last confirmed state of one key. Out-of-range keys read released.
    pub fn confirmed(&self, row: u8, col: u8) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.keys[col as usize * self.rows as usize + row as usize].confirmed
    }

    /// Interprets one sweep taken at `now`.
    ///
    /// Confirmed transitions are appended to `transitions` in scan order
    /// (column-major, then row within column). Returns the post-sample
    /// summary.
    pub fn process(
        &mut self,
        sample: &[RowMask],
        mask: &KeyMask,
        now: Instant,
        transitions: &mut Vec<KeyEvent>,
    ) -> FilterSummary {
        let frozen = if self.ghost_check {
            (self.predicate)(sample, mask)
        } else {
            Vec::new()
        };

        let mut summary = FilterSummary {
            active: 0,
            pending: 0,
        };

        for col in 0..self.cols {
            let col_sample = sample
                .get(col as usize)
                .copied()
                .unwrap_or(RowMask::EMPTY);
            let col_frozen = frozen
                .get(col as usize)
                .copied()
                .unwrap_or(RowMask::EMPTY);

            for row in 0..self.rows {
                let state = &mut self.keys[col as usize * self.rows as usize + row as usize];

                let raw = if col_frozen.get(row) {
                    // Ambiguous this sample: no state change permitted.
                    state.confirmed
                } else {
                    col_sample.get(row)
                };

                if raw == state.confirmed {
                    if state.pending_since.take().is_some() {
                        trace!("key ({row}, {col}) settled back, timer cleared");
                    }
                } else {
                    match state.pending_since {
                        None => {
                            state.pending_since = Some(now);
                        }
                        Some(since) => {
                            let required = if raw {
                                self.debounce_down
                            } else {
                                self.debounce_up
                            };
                            if now.duration_since(since) >= required {
                                state.confirmed = raw;
                                state.pending_since = None;
                                transitions.push(KeyEvent {
                                    row,
                                    col,
                                    pressed: raw,
                                });
                            }
                        }
                    }
                }

                if state.confirmed {
                    summary.active += 1;
                }
                if state.pending_since.is_some() {
                    summary.pending += 1;
                }
            }
        }

        summary
    }

    /// Discards every running debounce timer without emitting events.
    ///
    /// Unconfirmed transitions are treated as never having happened;
    /// confirmed states are kept.
    pub fn reset_pending(&mut self) {
        for key in &mut self.keys {
            key.pending_since = None;
        }
    }
}
