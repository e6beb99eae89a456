mod debounce;

use std::time::Duration;

use crate::config::MatrixConfig;

pub(crate) const DOWN_MS: u64 = 10;
pub(crate) const UP_MS: u64 = 20;

/// Test configuration: no settle delay, millisecond debounce windows.
pub(crate) fn test_config(rows: u8, cols: u8) -> MatrixConfig {
    MatrixConfig::builder(rows, cols)
        .settle_time(Duration::ZERO)
        .debounce(
            Duration::from_millis(DOWN_MS),
            Duration::from_millis(UP_MS),
        )
        .build()
        .unwrap()
}
