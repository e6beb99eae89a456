use std::time::{Duration, Instant};

use crate::debounce::DebounceFilter;
use crate::driver::RowMask;
use crate::event::KeyEvent;
use crate::mask::KeyMask;

use super::{test_config, DOWN_MS, UP_MS};

fn sample(cols: u8, active: &[(u8, u8)]) -> Vec<RowMask> {
    let mut out = vec![RowMask::EMPTY; cols as usize];
    for &(row, col) in active {
        out[col as usize].set(row, true);
    }
    out
}

struct Rig {
    filter: DebounceFilter,
    mask: KeyMask,
    base: Instant,
    events: Vec<KeyEvent>,
}

impl Rig {
    fn new(rows: u8, cols: u8) -> Self {
        let config = test_config(rows, cols);
        Self {
            filter: DebounceFilter::new(&config),
            mask: KeyMask::new(rows, cols),
            base: Instant::now(),
            events: Vec::new(),
        }
    }

    fn step(&mut self, active: &[(u8, u8)], at_ms: u64) -> crate::debounce::FilterSummary {
        let cols = self.mask.col_count();
        let sample = sample(cols, active);
        self.filter.process(
            &sample,
            &self.mask,
            self.base + Duration::from_millis(at_ms),
            &mut self.events,
        )
    }
}

#[test]
fn press_confirms_after_down_window() {
    let mut rig = Rig::new(3, 3);

    rig.step(&[(2, 1)], 0);
    rig.step(&[(2, 1)], 5);
    assert!(rig.events.is_empty());

    rig.step(&[(2, 1)], DOWN_MS);
    assert_eq!(
        rig.events,
        vec![KeyEvent {
            row: 2,
            col: 1,
            pressed: true
        }]
    );

    // Holding the key produces nothing further.
    rig.step(&[(2, 1)], DOWN_MS + 5);
    assert_eq!(rig.events.len(), 1);
}

#[test]
fn release_uses_the_up_window() {
    let mut rig = Rig::new(3, 3);

    rig.step(&[(2, 1)], 0);
    rig.step(&[(2, 1)], DOWN_MS);
    rig.events.clear();

    // Down-window worth of stability is not enough for a release.
    rig.step(&[], 30);
    rig.step(&[], 30 + DOWN_MS);
    assert!(rig.events.is_empty());

    rig.step(&[], 30 + UP_MS);
    assert_eq!(
        rig.events,
        vec![KeyEvent {
            row: 2,
            col: 1,
            pressed: false
        }]
    );
}

#[test]
fn glitch_shorter_than_window_ignored() {
    let mut rig = Rig::new(3, 3);

    rig.step(&[(2, 1)], 0);
    rig.step(&[], DOWN_MS / 2);
    rig.step(&[], 100);

    assert!(rig.events.is_empty());
    assert!(!rig.filter.confirmed(2, 1));
}

#[test]
fn bounce_restarts_the_window() {
    let mut rig = Rig::new(3, 3);

    // Toggle every half window, ten times: the timer never completes.
    let half = DOWN_MS / 2;
    for i in 0..10u64 {
        let keys: &[(u8, u8)] = if i % 2 == 0 { &[(2, 1)] } else { &[] };
        rig.step(keys, i * half);
    }
    assert!(rig.events.is_empty());

    // Then the contact settles: exactly one event, one window later.
    rig.step(&[(2, 1)], 100);
    rig.step(&[(2, 1)], 100 + half);
    assert!(rig.events.is_empty());
    rig.step(&[(2, 1)], 100 + DOWN_MS);
    assert_eq!(
        rig.events,
        vec![KeyEvent {
            row: 2,
            col: 1,
            pressed: true
        }]
    );
}

#[test]
fn summary_counts_active_and_pending() {
    let mut rig = Rig::new(2, 2);

    let summary = rig.step(&[(0, 0)], 0);
    assert_eq!(summary.active, 0);
    assert_eq!(summary.pending, 1);
    assert!(!summary.quiet());

    let summary = rig.step(&[(0, 0)], DOWN_MS);
    assert_eq!(summary.active, 1);
    assert_eq!(summary.pending, 0);

    let summary = rig.step(&[], 50 + UP_MS);
    assert_eq!(summary.active, 1);
    assert_eq!(summary.pending, 1);

    let summary = rig.step(&[], 50 + 2 * UP_MS);
    assert_eq!(summary.active, 0);
    assert_eq!(summary.pending, 0);
    assert!(summary.quiet());
}

#[test]
fn reset_pending_discards_timers() {
    let mut rig = Rig::new(2, 2);

    rig.step(&[(1, 1)], 0);
    rig.filter.reset_pending();

    // The old timer is gone; the next contrary sample starts over.
    rig.step(&[(1, 1)], DOWN_MS);
    assert!(rig.events.is_empty());
    rig.step(&[(1, 1)], 2 * DOWN_MS);
    assert_eq!(rig.events.len(), 1);
}

#[test]
fn ghost_square_cannot_confirm() {
    let mut rig = Rig::new(2, 2);

    // A full 2x2 raw square with nothing wired: every corner is frozen.
    for at in [0, DOWN_MS, 4 * DOWN_MS] {
        let summary = rig.step(&[(0, 0), (1, 0), (0, 1), (1, 1)], at);
        assert!(summary.quiet());
    }
    assert!(rig.events.is_empty());
}

#[test]
fn ghost_check_disabled_confirms_square() {
    let config = {
        let mut config = test_config(2, 2);
        config.ghost_check = false;
        config
    };
    let mut filter = DebounceFilter::new(&config);
    let mask = KeyMask::new(2, 2);
    let base = Instant::now();
    let mut events = Vec::new();

    let square = sample(2, &[(0, 0), (1, 0), (0, 1), (1, 1)]);
    filter.process(&square, &mask, base, &mut events);
    filter.process(
        &square,
        &mask,
        base + Duration::from_millis(DOWN_MS),
        &mut events,
    );

    // No suppression: all four confirm, in scan order.
    assert_eq!(events.len(), 4);
    assert_eq!((events[0].row, events[0].col), (0, 0));
    assert_eq!((events[1].row, events[1].col), (1, 0));
    assert_eq!((events[2].row, events[2].col), (0, 1));
    assert_eq!((events[3].row, events[3].col), (1, 1));
}
