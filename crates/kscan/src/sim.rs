//! Simulated matrix backend for host testing.
//!
//! [`SimBackend`] stands in for the board port: keys are pressed and
//! released through a cloneable [`SimHandle`] while the scanner owns the
//! backend itself. With ghost emulation on, readbacks model a diode-less
//! matrix: a pressed key conducts between its row and column line, so
//! driving a column activates every row reachable through pressed keys.
//! Three pressed corners of a rectangle really do read back the phantom
//! fourth.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::driver::{ColumnDrive, MatrixBackend, RowMask};
use crate::mask::OutOfBounds;

struct SimInner {
    rows: u8,
    cols: u8,
    // Physically pressed keys, per column.
    pressed: Vec<RowMask>,
    ghosting: bool,
    driven: ColumnDrive,
    detect_mode: bool,
}

impl SimInner {
    /// Rows that read active when `col` is driven.
    fn column_reading(&self, col: u8) -> RowMask {
        if col >= self.cols {
            return RowMask::EMPTY;
        }
        if !self.ghosting {
            return self.pressed[col as usize];
        }

        // Electrical closure: nodes are row lines (0..rows) and column
        // lines (rows..rows+cols); each pressed key joins its two lines.
        // A row reads active iff it is connected to the driven column.
        let mut dsu = Dsu::new(self.rows as usize + self.cols as usize);
        for c in 0..self.cols {
            for r in 0..self.rows {
                if self.pressed[c as usize].get(r) {
                    dsu.union(r as usize, self.rows as usize + c as usize);
                }
            }
        }

        let col_node = dsu.find(self.rows as usize + col as usize);
        let mut reading = RowMask::EMPTY;
        for r in 0..self.rows {
            if dsu.find(r as usize) == col_node {
                reading.set(r, true);
            }
        }
        reading
    }
}

struct Dsu {
    parent: Vec<usize>,
}

impl Dsu {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = node;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Simulated hardware backend. Owned by the scanner.
pub struct SimBackend {
    inner: Arc<Mutex<SimInner>>,
}

/// Cloneable control handle paired with a [`SimBackend`].
#[derive(Clone)]
pub struct SimHandle {
    inner: Arc<Mutex<SimInner>>,
}

impl SimBackend {
    /// Ideal matrix: readings mirror exactly the pressed keys.
    pub fn new(rows: u8, cols: u8) -> (Self, SimHandle) {
        Self::build(rows, cols, false)
    }

    /// Diode-less matrix with electrical ghost emulation.
    pub fn with_ghosting(rows: u8, cols: u8) -> (Self, SimHandle) {
        Self::build(rows, cols, true)
    }

    fn build(rows: u8, cols: u8, ghosting: bool) -> (Self, SimHandle) {
        let inner = Arc::new(Mutex::new(SimInner {
            rows,
            cols,
            pressed: vec![RowMask::EMPTY; cols as usize],
            ghosting,
            driven: ColumnDrive::None,
            detect_mode: false,
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            SimHandle { inner },
        )
    }
}

impl MatrixBackend for SimBackend {
    fn drive_column(&mut self, drive: ColumnDrive) {
        self.inner.lock().driven = drive;
    }

    fn read_row(&mut self) -> RowMask {
        let inner = self.inner.lock();
        match inner.driven {
            ColumnDrive::None => RowMask::EMPTY,
            ColumnDrive::All => {
                let mut reading = RowMask::EMPTY;
                for col in 0..inner.cols {
                    reading |= inner.column_reading(col);
                }
                reading
            }
            ColumnDrive::Single(col) => inner.column_reading(col),
        }
    }

    fn set_detect_mode(&mut self, enabled: bool) {
        self.inner.lock().detect_mode = enabled;
    }
}

impl SimHandle {
    pub fn press(&self, row: u8, col: u8) -> Result<(), OutOfBounds> {
        self.set_key(row, col, true)
    }

    pub fn release(&self, row: u8, col: u8) -> Result<(), OutOfBounds> {
        self.set_key(row, col, false)
    }

    pub fn release_all(&self) {
        let mut inner = self.inner.lock();
        inner.pressed.fill(RowMask::EMPTY);
    }

    fn set_key(&self, row: u8, col: u8, pressed: bool) -> Result<(), OutOfBounds> {
        let mut inner = self.inner.lock();
        if row >= inner.rows || col >= inner.cols {
            return Err(OutOfBounds { row, col });
        }
        inner.pressed[col as usize].set(row, pressed);
        Ok(())
    }

    /// The most recent column drive issued by the scanner.
    pub fn driven(&self) -> ColumnDrive {
        self.inner.lock().driven
    }

    /// Whether the wake-detect configuration is armed.
    pub fn detect_mode(&self) -> bool {
        self.inner.lock().detect_mode
    }

    /// What the scanner would read with `col` driven, ghost paths
    /// included.
    pub fn column_reading(&self, col: u8) -> RowMask {
        self.inner.lock().column_reading(col)
    }
}
