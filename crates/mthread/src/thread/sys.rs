//! Thin wrappers over the POSIX thread calls the runtime is built on.
//!
//! Everything here returns raw OS error codes; logging and error typing
//! happen one layer up in [`handle`](super::handle).

use std::ffi::CString;
use std::io;
use std::mem::MaybeUninit;
use std::os::raw::c_void;
use std::ptr;

/// Longest thread name the OS will accept, excluding the NUL terminator.
pub const OS_NAME_MAX: usize = 15;

/// Entry point signature expected by `pthread_create`.
pub(crate) type StartRoutine = extern "C" fn(*mut c_void) -> *mut c_void;

// ---------------------------------------------------------------------------
// NativeThread
// ---------------------------------------------------------------------------

/// An owned `pthread_t` that has been neither joined nor detached.
///
/// `join` and `detach` consume the value, so a handle can be released at most
/// once. Dropping a `NativeThread` does nothing; the owner decides which of
/// the two releases to perform.
#[derive(Debug)]
pub(crate) struct NativeThread(libc::pthread_t);

// SAFETY: a `pthread_t` is an opaque identifier that any thread may pass to
// `pthread_join`/`pthread_detach`.
unsafe impl Send for NativeThread {}
unsafe impl Sync for NativeThread {}

impl NativeThread {
    /// Create a native thread running `start(arg)`.
    ///
    /// # Safety
    /// `start` must treat `arg` according to whatever contract the caller
    /// established for it. If this returns `Err`, the thread was never
    /// created and `arg` has not been handed to `start`.
    pub(crate) unsafe fn spawn(
        start: StartRoutine,
        arg: *mut c_void,
        stack_size: Option<usize>,
    ) -> Result<Self, i32> {
        let mut attr = MaybeUninit::<libc::pthread_attr_t>::uninit();
        let rc = unsafe { libc::pthread_attr_init(attr.as_mut_ptr()) };
        if rc != 0 {
            return Err(rc);
        }
        // SAFETY: initialised by the successful `pthread_attr_init` above.
        let mut attr = unsafe { attr.assume_init() };

        let result = unsafe { create_with_attr(&mut attr, start, arg, stack_size) };

        unsafe { libc::pthread_attr_destroy(&mut attr) };
        result
    }

    /// Wrap the calling thread's own `pthread_self()`.
    #[cfg(test)]
    pub(crate) fn current() -> Self {
        NativeThread(unsafe { libc::pthread_self() })
    }

    /// Block until the thread terminates.
    ///
    /// On failure the handle is handed back untouched together with the
    /// error code, so the caller can still detach it later.
    pub(crate) fn join(self) -> Result<(), (Self, i32)> {
        let rc = unsafe { libc::pthread_join(self.0, ptr::null_mut()) };
        if rc == 0 { Ok(()) } else { Err((self, rc)) }
    }

    /// Let the thread run to completion on its own; the OS reclaims it.
    pub(crate) fn detach(self) -> Result<(), i32> {
        let rc = unsafe { libc::pthread_detach(self.0) };
        if rc == 0 { Ok(()) } else { Err(rc) }
    }
}

unsafe fn create_with_attr(
    attr: &mut libc::pthread_attr_t,
    start: StartRoutine,
    arg: *mut c_void,
    stack_size: Option<usize>,
) -> Result<NativeThread, i32> {
    if let Some(size) = stack_size {
        let rc = unsafe { libc::pthread_attr_setstacksize(attr, size) };
        if rc != 0 {
            return Err(rc);
        }
    }

    let mut native = MaybeUninit::<libc::pthread_t>::uninit();
    let rc = unsafe { libc::pthread_create(native.as_mut_ptr(), attr, start, arg) };
    if rc != 0 {
        return Err(rc);
    }
    // SAFETY: `pthread_create` succeeded and wrote the handle.
    Ok(NativeThread(unsafe { native.assume_init() }))
}

// ---------------------------------------------------------------------------
// Thread ids
// ---------------------------------------------------------------------------

/// The calling thread's OS-assigned numeric id (the kernel tid on Linux).
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn current_thread_id() -> u64 {
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

/// The calling thread's OS-assigned numeric id.
#[cfg(target_vendor = "apple")]
pub fn current_thread_id() -> u64 {
    let mut id = 0u64;
    unsafe { libc::pthread_threadid_np(libc::pthread_self(), &mut id) };
    id
}

/// The calling thread's `pthread_self()` value, widened to `u64`.
#[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
pub fn current_thread_id() -> u64 {
    unsafe { libc::pthread_self() as usize as u64 }
}

// ---------------------------------------------------------------------------
// OS-visible names
// ---------------------------------------------------------------------------

/// Cut `name` down to at most [`OS_NAME_MAX`] bytes without splitting a
/// UTF-8 character.
pub fn truncate_os_name(name: &str) -> &str {
    if name.len() <= OS_NAME_MAX {
        return name;
    }
    let mut end = OS_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Label the calling thread for debuggers, `ps` and `/proc`.
///
/// Longer names are truncated silently.
pub(crate) fn set_current_os_name(name: &str) -> io::Result<()> {
    let c_name = CString::new(truncate_os_name(name))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    let rc = unsafe { libc::pthread_setname_np(libc::pthread_self(), c_name.as_ptr()) };

    #[cfg(target_vendor = "apple")]
    let rc = unsafe { libc::pthread_setname_np(c_name.as_ptr()) };

    #[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
    let rc = {
        let _ = c_name;
        0
    };

    if rc == 0 { Ok(()) } else { Err(io::Error::from_raw_os_error(rc)) }
}

/// Read back the calling thread's OS-visible name, if the platform has one.
pub fn current_os_name() -> Option<String> {
    #[cfg(any(target_os = "linux", target_vendor = "apple"))]
    {
        let mut buf = [0 as libc::c_char; OS_NAME_MAX + 1];
        let rc = unsafe { libc::pthread_getname_np(libc::pthread_self(), buf.as_mut_ptr(), buf.len()) };
        if rc != 0 {
            return None;
        }
        let name = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) };
        Some(name.to_string_lossy().into_owned())
    }

    #[cfg(not(any(target_os = "linux", target_vendor = "apple")))]
    {
        None
    }
}
