//! Wall-clock helper
//!
//! Every externally visible record in the mirror (ladder levels, snapshots,
//! push frames, response envelopes) is stamped with a millisecond epoch
//! timestamp.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in millis; anything earlier means a broken clock source.
        assert!(now_millis() > 1_577_836_800_000);
    }
}
