//! Tests for MatrixConfig builder and validation.

use std::time::Duration;

use kscan::{ConfigError, MatrixConfig};

#[test]
fn builder_defaults() {
    let config = MatrixConfig::new(8, 16).unwrap();

    assert_eq!(config.row_count, 8);
    assert_eq!(config.col_count, 16);
    assert_eq!(config.poll_period, Duration::from_millis(5));
    assert_eq!(config.settle_time, Duration::from_micros(50));
    assert_eq!(config.debounce_down, Duration::from_millis(10));
    assert_eq!(config.debounce_up, Duration::from_millis(20));
    assert_eq!(config.poll_timeout, None);
    assert!(config.ghost_check);
    assert_eq!(config.key_count(), 128);
}

#[test]
fn builder_overrides() {
    let config = MatrixConfig::builder(4, 4)
        .poll_period(Duration::from_millis(1))
        .settle_time(Duration::ZERO)
        .debounce(Duration::from_millis(3), Duration::from_millis(7))
        .poll_timeout(Duration::from_millis(100))
        .ghost_check(false)
        .build()
        .unwrap();

    assert_eq!(config.poll_period, Duration::from_millis(1));
    assert_eq!(config.settle_time, Duration::ZERO);
    assert_eq!(config.debounce_down, Duration::from_millis(3));
    assert_eq!(config.debounce_up, Duration::from_millis(7));
    assert_eq!(config.poll_timeout, Some(Duration::from_millis(100)));
    assert!(!config.ghost_check);
}

#[test]
fn empty_matrix_rejected() {
    assert_eq!(
        MatrixConfig::new(0, 4).unwrap_err(),
        ConfigError::EmptyMatrix { rows: 0, cols: 4 }
    );
    assert_eq!(
        MatrixConfig::new(4, 0).unwrap_err(),
        ConfigError::EmptyMatrix { rows: 4, cols: 0 }
    );
}

#[test]
fn oversized_row_count_rejected() {
    assert_eq!(
        MatrixConfig::new(33, 4).unwrap_err(),
        ConfigError::RowCountTooLarge(33)
    );
    assert!(MatrixConfig::new(32, 4).is_ok());
}

#[test]
fn debounce_for_picks_the_direction() {
    let config = MatrixConfig::builder(2, 2)
        .debounce(Duration::from_millis(3), Duration::from_millis(7))
        .build()
        .unwrap();

    assert_eq!(config.debounce_for(true), Duration::from_millis(3));
    assert_eq!(config.debounce_for(false), Duration::from_millis(7));
}
