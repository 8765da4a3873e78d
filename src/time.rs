//! Millisecond-epoch time helpers.
//!
//! The spec's lifetimes (token expiry, TTL deadlines) are expressed in
//! milliseconds; `std::time::Instant` is used for monotonic TTL bookkeeping
//! and converted to/from epoch millis only at the auth-request boundary.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before Unix epoch")
        .as_millis() as i64
}
