//! Matrix geometry and timing configuration.
//!
//! The configuration is immutable once built; the only runtime-mutable
//! datum of the engine is the wired-key mask (see [`crate::mask`]).

use std::time::Duration;

use thiserror::Error;

use crate::driver::RowMask;
use crate::ghost::{pairwise_overlap, GhostPredicate};

/// Errors produced by configuration validation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("matrix must have at least one row and one column, got {rows}x{cols}")]
    EmptyMatrix { rows: u8, cols: u8 },
    #[error("row count {0} exceeds the {max} row readback width", max = RowMask::WIDTH)]
    RowCountTooLarge(u8),
    #[error("key mask shaped {got_rows}x{got_cols} does not fit a {rows}x{cols} matrix")]
    MaskShape {
        rows: u8,
        cols: u8,
        got_rows: u8,
        got_cols: u8,
    },
}

/// Immutable scan configuration.
///
/// Built through [`MatrixConfig::builder`]; validation happens once, in
/// [`MatrixConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    /// Number of physical rows, at most [`RowMask::WIDTH`].
    pub row_count: u8,
    /// Number of physical columns.
    pub col_count: u8,
    /// Cadence of full-matrix sweeps while polling.
    pub poll_period: Duration,
    /// Delay between energizing a column and sampling its rows.
    pub settle_time: Duration,
    /// How long a press must persist before it is confirmed.
    pub debounce_down: Duration,
    /// How long a release must persist before it is confirmed.
    pub debounce_up: Duration,
    /// Keep polling this long after the last activity before entering
    /// detect mode; `None` idles on the first fully quiet sweep.
    pub poll_timeout: Option<Duration>,
    /// Toggle ghost-combination rejection.
    pub ghost_check: bool,
    /// Predicate deciding which keys a raw sample cannot confirm.
    pub ghost_predicate: GhostPredicate,
}

impl MatrixConfig {
    /// Creates a configuration builder for a `rows` x `cols` matrix.
    pub fn builder(rows: u8, cols: u8) -> MatrixConfigBuilder {
        MatrixConfigBuilder::new(rows, cols)
    }

    /// Configuration with default timings, validated.
    pub fn new(rows: u8, cols: u8) -> Result<Self, ConfigError> {
        Self::builder(rows, cols).build()
    }

    /// Total number of keys in the matrix.
    pub fn key_count(&self) -> usize {
        self.row_count as usize * self.col_count as usize
    }

    /// Debounce duration for the given transition direction.
    pub fn debounce_for(&self, pressed: bool) -> Duration {
        if pressed {
            self.debounce_down
        } else {
            self.debounce_up
        }
    }
}

/// Builder for ergonomic configuration construction.
#[derive(Debug, Clone)]
pub struct MatrixConfigBuilder {
    config: MatrixConfig,
}

impl MatrixConfigBuilder {
    fn new(rows: u8, cols: u8) -> Self {
        Self {
            config: MatrixConfig {
                row_count: rows,
                col_count: cols,
                poll_period: Duration::from_millis(5),
                settle_time: Duration::from_micros(50),
                debounce_down: Duration::from_millis(10),
                debounce_up: Duration::from_millis(20),
                poll_timeout: None,
                ghost_check: true,
                ghost_predicate: pairwise_overlap,
            },
        }
    }

    /// Sets the sweep cadence while polling.
    pub fn poll_period(mut self, period: Duration) -> Self {
        self.config.poll_period = period;
        self
    }

    /// Sets the column settle delay.
    pub fn settle_time(mut self, settle: Duration) -> Self {
        self.config.settle_time = settle;
        self
    }

    /// Sets the press and release debounce durations.
    pub fn debounce(mut self, down: Duration, up: Duration) -> Self {
        self.config.debounce_down = down;
        self.config.debounce_up = up;
        self
    }

    /// Keeps the scanner polling for `timeout` after the last activity.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = Some(timeout);
        self
    }

    /// Enables or disables ghost-combination rejection.
    pub fn ghost_check(mut self, enabled: bool) -> Self {
        self.config.ghost_check = enabled;
        self
    }

    /// Replaces the ghost predicate.
    pub fn ghost_predicate(mut self, predicate: GhostPredicate) -> Self {
        self.config.ghost_predicate = predicate;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<MatrixConfig, ConfigError> {
        let config = self.config;
        if config.row_count == 0 || config.col_count == 0 {
            return Err(ConfigError::EmptyMatrix {
                rows: config.row_count,
                cols: config.col_count,
            });
        }
        if config.row_count > RowMask::WIDTH {
            return Err(ConfigError::RowCountTooLarge(config.row_count));
        }
        Ok(config)
    }
}
