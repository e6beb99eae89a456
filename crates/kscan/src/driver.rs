//! Column driver capability contract.
//!
//! A board port implements [`MatrixBackend`] on top of whatever the
//! hardware offers: GPIO banks, an I/O expander, a shift register. The
//! scan engine only ever energizes columns and reads back a row bitmask.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row readback bitmask.
///
/// Bit *i* set means row *i* is active (pressed) for the currently driven
/// column. The backing word bounds the matrix at [`RowMask::WIDTH`] rows;
/// width selection happens once, at configuration build time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowMask(pub u32);

impl RowMask {
    /// No rows active.
    pub const EMPTY: Self = Self(0);

    /// Number of rows a single mask can represent.
    pub const WIDTH: u8 = u32::BITS as u8;

    /// Mask with only `row` set.
    #[inline]
    pub const fn bit(row: u8) -> Self {
        Self(1 << row)
    }

    #[inline]
    pub const fn get(self, row: u8) -> bool {
        self.0 & (1 << row) != 0
    }

    #[inline]
    pub fn set(&mut self, row: u8, active: bool) {
        if active {
            self.0 |= 1 << row;
        } else {
            self.0 &= !(1 << row);
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of active rows.
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitAnd for RowMask {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for RowMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAndAssign for RowMask {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOrAssign for RowMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Not for RowMask {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Column energize selector.
///
/// `All` is the low-power wake configuration (any pressed key pulls its
/// row); `None` releases the matrix between sweeps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDrive {
    /// Release every column.
    None,
    /// Energize every column simultaneously.
    All,
    /// Energize exactly one column.
    Single(u8),
}

/// Capability contract implemented by the hardware backend.
///
/// All operations are infallible and must not block at poll rate; a stuck
/// pin simply shows up as a persistent reading and is handled like any
/// other raw value.
pub trait MatrixBackend {
    /// Energize the selected column(s). Physical side effect only.
    fn drive_column(&mut self, drive: ColumnDrive);

    /// Sample the row lines for the currently driven column.
    ///
    /// Returns [`RowMask::EMPTY`] when no column is driven. The reading
    /// must already reflect the hardware settle time.
    fn read_row(&mut self) -> RowMask;

    /// Switch between active polling and the low-power wake-detect
    /// configuration. Observable side effect used to confirm idle entry.
    fn set_detect_mode(&mut self, enabled: bool);
}
