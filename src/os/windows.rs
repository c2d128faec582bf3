//! Windows-specific operating system features.

use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use tracing::warn;
use winapi::shared::minwindef::FILETIME;
use winapi::um::fileapi::{CreateFileW, OPEN_EXISTING, SetFileTime};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::winnt::{FILE_ATTRIBUTE_NORMAL, FILE_WRITE_ATTRIBUTES};

/// Set the creation time of `path` to `ticks` (100ns intervals since 1601).
///
/// Access and write times are left untouched.
pub fn set_creation_time(path: &Path, ticks: u64) -> bool {
    let path_utf16: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let handle = unsafe {
        CreateFileW(
            path_utf16.as_ptr(),
            FILE_WRITE_ATTRIBUTES,
            0,
            std::ptr::null_mut(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            std::ptr::null_mut(),
        )
    };

    if handle == INVALID_HANDLE_VALUE {
        warn!(
            ?path,
            error = %std::io::Error::last_os_error(),
            "Failed to open file for creation time update"
        );
        return false;
    }

    let creation_time = FILETIME {
        dwLowDateTime: (ticks & 0xFFFF_FFFF) as u32,
        dwHighDateTime: (ticks >> 32) as u32,
    };

    let success = unsafe {
        SetFileTime(
            handle,
            &creation_time,
            std::ptr::null(),
            std::ptr::null(),
        )
    };
    let error = std::io::Error::last_os_error();

    unsafe {
        CloseHandle(handle);
    }

    if success == 0 {
        warn!(?path, %error, "Failed to set creation time");
        return false;
    }

    true
}
