//! Shared constants for the application

use std::time::Duration;

pub const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Default period between full refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

/// Shortest period the refresh loop accepts
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(100);
