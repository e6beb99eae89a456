//! # kscan
//!
//! A keyboard matrix scanning engine: column-drive polling, asymmetric
//! per-key debounce, ghost-key suppression and an ordered event pipeline,
//! behind a trait seam for the hardware backend. The engine targets host
//! builds; a board port supplies the [`MatrixBackend`] implementation that
//! actually touches pins.
//!
//! ## Module Overview
//! - [`config`]   – Matrix geometry and timing configuration.
//! - [`driver`]   – Column driver capability contract.
//! - [`mask`]     – Wired-key mask with runtime mutation.
//! - [`debounce`] – Debounce and ghost filtering.
//! - [`ghost`]    – Ghost key detection predicate.
//! - [`event`]    – Key event encoding and delivery sinks.
//! - [`scanner`]  – Poll loop and scan state machine.
//! - [`sim`]      – Simulated backend for host testing.
//!
//! The modules are loosely coupled so that the filter and the event
//! encoding can be reused without the poll loop.

pub mod config;
pub mod debounce;
pub mod driver;
pub mod event;
pub mod ghost;
pub mod mask;
pub mod scanner;
pub mod sim;

pub use config::{ConfigError, MatrixConfig, MatrixConfigBuilder};
pub use debounce::{DebounceFilter, FilterSummary};
pub use driver::{ColumnDrive, MatrixBackend, RowMask};
pub use event::{Code, EventSink, KeyEvent, KeyEventCollector, Report};
pub use ghost::{pairwise_overlap, GhostPredicate};
pub use ktrace::{TraceError, TraceHook};
pub use mask::{KeyMask, KeyMaskHandle, OutOfBounds};
pub use scanner::{ScanState, Scanner, ScannerBuilder};
pub use sim::{SimBackend, SimHandle};

#[cfg(test)]
mod tests;
