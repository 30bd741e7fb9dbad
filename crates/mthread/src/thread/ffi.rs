//! C FFI surface for managed threads.
//!
//! All functions use the `mthread_` prefix. Handles returned by
//! [`mthread_spawn`] are owned by the caller and must be released exactly once
//! with either [`mthread_join`] or [`mthread_release`].

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use super::handle::Thread;

/// Entry point of a thread spawned from C.
pub type ThreadEntry = extern "C" fn(arg: *mut c_void);

/// Caller-provided argument forwarded to the spawned thread.
struct SendPtr(*mut c_void);

// SAFETY: the C caller vouches that `arg` may be used from the new thread.
unsafe impl Send for SendPtr {}

impl SendPtr {
    fn into_inner(self) -> *mut c_void {
        self.0
    }
}

unsafe fn read_name(name: *const c_char) -> String {
    if name.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(name) }
        .to_string_lossy()
        .into_owned()
}

// ===========================================================================
// Thread management
// ===========================================================================

/// Spawn a managed thread that calls `entry(arg)`.
///
/// Returns an owned handle, or null if `entry` is null or the thread could
/// not be created (the failure is logged). A null or empty `name` gives the
/// thread the name `"UNKNOWN"`.
///
/// # Safety
/// `name` must be null or a valid NUL-terminated string. `arg` must be safe
/// to use from the new thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mthread_spawn(
    entry: Option<ThreadEntry>,
    arg: *mut c_void,
    name: *const c_char,
) -> *mut Thread {
    let Some(entry) = entry else {
        tracing::warn!("mthread_spawn: null entry point");
        return ptr::null_mut();
    };

    let name = unsafe { read_name(name) };
    let arg = SendPtr(arg);

    match Thread::new(move || entry(arg.into_inner()), name) {
        Ok(thread) => Box::into_raw(Box::new(thread)),
        Err(_) => ptr::null_mut(),
    }
}

/// Join a thread and free its handle.
///
/// Returns 0 on success or the OS error code of the failed join; the handle
/// is freed either way (an unjoined thread is detached).
///
/// # Safety
/// `ptr` must be a handle returned by `mthread_spawn` that has not been
/// released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mthread_join(ptr: *mut Thread) -> c_int {
    if ptr.is_null() {
        tracing::warn!("mthread_join: null pointer");
        return libc::EINVAL;
    }

    let mut thread = unsafe { Box::from_raw(ptr) };
    match thread.join() {
        Ok(()) => 0,
        Err(err) => err.code(),
    }
    // Box drops here; a still-joinable thread is detached.
}

/// Free a handle without joining; the thread is detached.
///
/// # Safety
/// `ptr` must be a handle returned by `mthread_spawn` that has not been
/// released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mthread_release(ptr: *mut Thread) {
    if ptr.is_null() {
        tracing::warn!("mthread_release: null pointer");
        return;
    }

    let _thread = unsafe { Box::from_raw(ptr) };
}

/// OS thread id of a spawned thread, or 0 on null input.
///
/// # Safety
/// `ptr` must be null or a live handle returned by `mthread_spawn`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mthread_id(ptr: *const Thread) -> u64 {
    if ptr.is_null() {
        return 0;
    }
    unsafe { &*ptr }.id()
}

// ===========================================================================
// Per-thread context
// ===========================================================================

/// Rename the calling thread. Null or empty names are ignored.
///
/// # Safety
/// `name` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mthread_set_current_name(name: *const c_char) {
    let name = unsafe { read_name(name) };
    Thread::set_current_name(&name);
}

/// Copy the calling thread's name into `buf` (NUL-terminated, truncated to
/// fit `len`).
///
/// Returns the full length of the name in bytes, excluding the terminator,
/// so callers can detect truncation like with `snprintf`.
///
/// # Safety
/// `buf` must be null or valid for writes of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mthread_current_name(buf: *mut c_char, len: usize) -> usize {
    let name = Thread::current_name();
    if !buf.is_null() && len > 0 {
        let copied = name.len().min(len - 1);
        unsafe {
            ptr::copy_nonoverlapping(name.as_ptr().cast::<c_char>(), buf, copied);
            *buf.add(copied) = 0;
        }
    }
    name.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    extern "C" fn send_current_name(arg: *mut c_void) {
        let tx = unsafe { &*(arg as *const mpsc::Sender<String>) };
        tx.send(Thread::current_name()).unwrap();
    }

    #[test]
    fn test_spawn_and_join() {
        let (tx, rx) = mpsc::channel::<String>();
        let tx = Box::into_raw(Box::new(tx));

        let handle = unsafe { mthread_spawn(Some(send_current_name), tx.cast(), c"ffi-worker".as_ptr()) };
        assert!(!handle.is_null());
        assert_ne!(unsafe { mthread_id(handle) }, 0);
        assert_eq!(unsafe { mthread_join(handle) }, 0);

        assert_eq!(rx.recv().unwrap(), "ffi-worker");
        drop(unsafe { Box::from_raw(tx) });
    }

    #[test]
    fn test_spawn_null_name_is_unknown() {
        let (tx, rx) = mpsc::channel::<String>();
        let tx = Box::into_raw(Box::new(tx));

        let handle = unsafe { mthread_spawn(Some(send_current_name), tx.cast(), ptr::null()) };
        assert!(!handle.is_null());
        assert_eq!(unsafe { mthread_join(handle) }, 0);

        assert_eq!(rx.recv().unwrap(), crate::thread::UNKNOWN_NAME);
        drop(unsafe { Box::from_raw(tx) });
    }

    #[test]
    fn test_null_inputs() {
        assert!(unsafe { mthread_spawn(None, ptr::null_mut(), ptr::null()) }.is_null());
        assert_eq!(unsafe { mthread_join(ptr::null_mut()) }, libc::EINVAL);
        assert_eq!(unsafe { mthread_id(ptr::null()) }, 0);
        unsafe { mthread_release(ptr::null_mut()) };
    }

    #[test]
    fn test_current_name_buffer() {
        std::thread::spawn(|| {
            unsafe { mthread_set_current_name(c"reporter".as_ptr()) };

            let mut buf = [0 as c_char; 5];
            let full = unsafe { mthread_current_name(buf.as_mut_ptr(), buf.len()) };
            assert_eq!(full, "reporter".len());
            let copied = unsafe { CStr::from_ptr(buf.as_ptr()) };
            assert_eq!(copied.to_str().unwrap(), "repo");

            assert_eq!(unsafe { mthread_current_name(ptr::null_mut(), 0) }, full);
        })
        .join()
        .unwrap();
    }
}
