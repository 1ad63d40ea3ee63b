//! Value conversions at the C boundary.
//!
//! Std-only: this file is embedded verbatim into generated shims inside
//! `mod convert { ... }`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

pub fn bool_to_c(value: bool) -> c_char {
    if value { 1 } else { 0 }
}

/// Any non-zero byte decodes to `true`.
pub fn c_to_bool(value: c_char) -> bool {
    value != 0
}

/// Hands ownership of a NUL-terminated copy to the caller. Text with an
/// interior NUL becomes a null pointer.
pub fn string_to_c(value: String) -> *mut c_char {
    CString::new(value)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Copies a borrowed C string; `value` must be null or NUL-terminated.
/// Null decodes to the empty string, invalid UTF-8 is replaced.
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub fn c_to_string(value: *mut c_char) -> String {
    if value.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned()
}

/// Exception text for the host. Interior NULs would truncate the message,
/// so they become spaces.
pub fn error_message(message: &str) -> CString {
    CString::new(message.replace('\0', " ")).unwrap_or_default()
}
