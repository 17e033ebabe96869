//! Wall-clock helpers.
//!
//! Pool decisions (growth, culling, delayed despawns) never read the clock;
//! every time-dependent operation takes a `now_ms` argument. Hosts that have
//! no frame clock of their own can feed it from here. Observer event
//! timestamps are the one place the core stamps wall-clock time itself.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Returns 0 if the system clock is set
/// before the epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}
