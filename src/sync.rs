//! File system timestamp synchronization
//!
//! Downloaded files get their access, modification and (where supported)
//! creation times set to the capture instant. Copies made by the EXIF
//! propagator get the source file's own times instead. Failures are logged
//! and reported in the outcome, never returned as errors.

use crate::error::Error;
use crate::os;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// What the synchronizer managed to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    /// Access and modification time were set
    pub times_set: bool,
    /// Creation time was set (only possible on Windows)
    pub creation_set: bool,
}

/// Source file times to replay onto a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub accessed: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

impl FileTimes {
    /// Read a file's times; creation time falls back to modification time
    pub fn read(path: &Path) -> crate::error::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let accessed = metadata.accessed().unwrap_or(modified);
        let created = metadata.created().unwrap_or(modified);
        Ok(Self {
            accessed: accessed.into(),
            modified: modified.into(),
            created: created.into(),
        })
    }
}

fn to_filetime(instant: DateTime<Utc>) -> FileTime {
    FileTime::from_unix_time(instant.timestamp(), instant.timestamp_subsec_nanos())
}

/// Set access, modification and creation time of `path` to `instant`
pub fn apply_capture_time(path: &Path, instant: DateTime<Utc>) -> SyncOutcome {
    apply_file_times(
        path,
        &FileTimes {
            accessed: instant,
            modified: instant,
            created: instant,
        },
    )
}

/// Set each of `path`'s times from `times`
pub fn apply_file_times(path: &Path, times: &FileTimes) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    match filetime::set_file_times(path, to_filetime(times.accessed), to_filetime(times.modified)) {
        Ok(()) => outcome.times_set = true,
        Err(e) => {
            let error = Error::TimestampSync {
                path: path.to_path_buf(),
                message: e.to_string(),
            };
            warn!(error = %error, "Could not set file timestamps");
        }
    }

    if os::supports_creation_time() {
        outcome.creation_set = os::try_set_creation_time(path, times.created);
    }

    debug!(?path, ?outcome, "Synchronized file timestamps");
    outcome
}

/// Modification time of `path` as a UTC instant
pub fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_apply_capture_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"data").unwrap();

        let instant = Utc.with_ymd_and_hms(2026, 1, 18, 19, 16, 29).unwrap();
        let outcome = apply_capture_time(&path, instant);
        assert!(outcome.times_set);
        assert_eq!(outcome.creation_set, os::supports_creation_time());

        assert_eq!(modified_time(&path), Some(instant));
        let accessed: DateTime<Utc> = fs::metadata(&path).unwrap().accessed().unwrap().into();
        assert_eq!(accessed, instant);
    }

    #[test]
    fn test_apply_file_times_distinct() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"data").unwrap();

        let times = FileTimes {
            accessed: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
            modified: Utc.with_ymd_and_hms(2025, 4, 30, 12, 0, 0).unwrap(),
            created: Utc.with_ymd_and_hms(2025, 4, 30, 12, 0, 0).unwrap(),
        };
        let outcome = apply_file_times(&path, &times);
        assert!(outcome.times_set);

        let metadata = fs::metadata(&path).unwrap();
        let modified: DateTime<Utc> = metadata.modified().unwrap().into();
        let accessed: DateTime<Utc> = metadata.accessed().unwrap().into();
        assert_eq!(modified, times.modified);
        assert_eq!(accessed, times.accessed);
    }

    #[test]
    fn test_missing_file_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.jpg");

        let instant = Utc.with_ymd_and_hms(2026, 1, 18, 19, 16, 29).unwrap();
        let outcome = apply_capture_time(&path, instant);
        assert!(!outcome.times_set);
        assert!(!outcome.creation_set);
    }

    #[test]
    fn test_read_file_times() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"data").unwrap();

        let instant = Utc.with_ymd_and_hms(2024, 8, 1, 10, 0, 0).unwrap();
        apply_capture_time(&path, instant);

        let times = FileTimes::read(&path).unwrap();
        assert_eq!(times.modified, instant);
    }
}
