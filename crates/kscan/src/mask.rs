//! Wired-key mask.
//!
//! Irregular matrices leave intersections unpopulated; the mask records
//! which keys physically exist so the ghost predicate can tell deliberate
//! wiring from short ambiguity. It is the one datum an external caller
//! may mutate while the scanner runs, so it lives behind a cloneable
//! handle; a mutation mid-sweep takes effect on the next sample.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::driver::RowMask;

/// Key coordinate outside the configured matrix.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("key ({row}, {col}) is outside the matrix")]
pub struct OutOfBounds {
    pub row: u8,
    pub col: u8,
}

/// Per-column bitmask of physically wired keys.
///
/// Defaults to all-unwired, which makes every key a ghost candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMask {
    rows: u8,
    cols: Vec<RowMask>,
}

impl KeyMask {
    /// Mask with no keys marked wired.
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            rows,
            cols: vec![RowMask::EMPTY; cols as usize],
        }
    }

    /// Mask with every key marked wired (a fully populated matrix).
    pub fn filled(rows: u8, cols: u8) -> Self {
        let mut all = RowMask::EMPTY;
        for row in 0..rows {
            all.set(row, true);
        }
        Self {
            rows,
            cols: vec![all; cols as usize],
        }
    }

    pub fn row_count(&self) -> u8 {
        self.rows
    }

    pub fn col_count(&self) -> u8 {
        self.cols.len() as u8
    }

    /// Marks one key wired or unwired.
    pub fn set(&mut self, row: u8, col: u8, present: bool) -> Result<(), OutOfBounds> {
        if row >= self.rows || col as usize >= self.cols.len() {
            return Err(OutOfBounds { row, col });
        }
        self.cols[col as usize].set(row, present);
        Ok(())
    }

    /// Whether the key is marked wired. Out-of-range keys read unwired.
    pub fn wired(&self, row: u8, col: u8) -> bool {
        row < self.rows && self.column(col).get(row)
    }

    /// Wired rows of one column. Out-of-range columns read empty.
    pub fn column(&self, col: u8) -> RowMask {
        self.cols
            .get(col as usize)
            .copied()
            .unwrap_or(RowMask::EMPTY)
    }
}

/// Cloneable, shareable handle to a [`KeyMask`].
#[derive(Debug, Clone)]
pub struct KeyMaskHandle {
    inner: Arc<Mutex<KeyMask>>,
}

impl KeyMaskHandle {
    pub fn new(mask: KeyMask) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mask)),
        }
    }

    pub fn set(&self, row: u8, col: u8, present: bool) -> Result<(), OutOfBounds> {
        self.inner.lock().set(row, col, present)
    }

    pub fn wired(&self, row: u8, col: u8) -> bool {
        self.inner.lock().wired(row, col)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, KeyMask> {
        self.inner.lock()
    }
}
