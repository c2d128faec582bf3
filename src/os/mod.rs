//! Platform-specific module for operating system features.
//!
//! Only Windows exposes a writable file creation time. Callers use
//! [`try_set_creation_time`] everywhere; on other platforms it is a no-op
//! that reports `false`.

#[cfg(windows)]
pub mod windows;

use chrono::{DateTime, Utc};
use std::path::Path;

/// Offset between 1601-01-01 and 1970-01-01 in 100ns ticks
pub const FILETIME_UNIX_EPOCH: u64 = 116_444_736_000_000_000;

/// 100ns ticks per second
pub const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;

/// Convert an instant to Windows FILETIME ticks (100ns since 1601-01-01).
///
/// Instants before 1601 clamp to zero.
pub fn to_filetime_ticks(instant: DateTime<Utc>) -> u64 {
    let ticks = i128::from(instant.timestamp()) * i128::from(FILETIME_TICKS_PER_SECOND)
        + i128::from(instant.timestamp_subsec_nanos() / 100)
        + i128::from(FILETIME_UNIX_EPOCH);
    ticks.clamp(0, i128::from(u64::MAX)) as u64
}

/// Whether this platform lets us set a file's creation time.
pub fn supports_creation_time() -> bool {
    cfg!(windows)
}

/// Set the creation time of `path`.
///
/// Returns `true` if the creation time was written.
#[cfg(windows)]
pub fn try_set_creation_time(path: &Path, instant: DateTime<Utc>) -> bool {
    windows::set_creation_time(path, to_filetime_ticks(instant))
}

/// Set the creation time of `path`.
///
/// Always `false` here: there is no portable way to change a birth time.
#[cfg(not(windows))]
pub fn try_set_creation_time(_path: &Path, _instant: DateTime<Utc>) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_epoch_ticks() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(to_filetime_ticks(epoch), FILETIME_UNIX_EPOCH);
    }

    #[test]
    fn test_capture_instant_ticks() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 18, 19, 16, 29).unwrap();
        let expected = instant.timestamp() as u64 * FILETIME_TICKS_PER_SECOND + FILETIME_UNIX_EPOCH;
        assert_eq!(to_filetime_ticks(instant), expected);
    }

    #[test]
    fn test_subsecond_ticks() {
        let instant = Utc.timestamp_opt(1, 500_000_000).unwrap();
        assert_eq!(
            to_filetime_ticks(instant),
            FILETIME_UNIX_EPOCH + FILETIME_TICKS_PER_SECOND + 5_000_000
        );
    }

    #[test]
    fn test_pre_1601_clamps() {
        let instant = Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_filetime_ticks(instant), 0);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_unsupported_platform_is_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("file.jpg");
        std::fs::write(&path, b"x").unwrap();
        assert!(!supports_creation_time());
        assert!(!try_set_creation_time(&path, Utc::now()));
    }
}
