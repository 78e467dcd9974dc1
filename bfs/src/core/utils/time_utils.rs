// SPDX-License-Identifier: MIT

//! Timestamps for the superblock and inodes.
//!
//! In `std` mode the system clock is used; in `no_std` every timestamp is
//! the Unix epoch.

use time::OffsetDateTime;

/// Current UTC time.
pub fn now_utc() -> OffsetDateTime {
    #[cfg(feature = "std")]
    {
        OffsetDateTime::now_utc()
    }

    #[cfg(not(feature = "std"))]
    {
        OffsetDateTime::UNIX_EPOCH
    }
}

/// Current time as seconds since the Unix epoch.
#[inline]
pub fn now_unix() -> i64 {
    now_utc().unix_timestamp()
}

/// Converts a stored timestamp back, `None` when out of range.
pub fn from_unix(secs: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs).ok()
}
