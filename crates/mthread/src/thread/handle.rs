//! Managed thread handle with a startup handshake and detach-on-drop semantics.

use std::{
    any::Any,
    fmt,
    os::raw::c_void,
    panic::{self, AssertUnwindSafe},
    ptr,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use super::builder::Builder;
use super::context;
use super::semaphore::Semaphore;
use super::sys::{self, NativeThread};
use super::UNKNOWN_NAME;
use crate::error::{ThreadError, ThreadResult};

// ---------------------------------------------------------------------------
// Conditional trace logging
// ---------------------------------------------------------------------------

macro_rules! thread_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "thread-debug")]
        tracing::trace!($($arg)*);
    };
}

type Callback = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared between the owning [`Thread`] and the native thread.
///
/// The native thread holds its own `Arc` (handed over through the
/// `pthread_create` argument), so this outlives the owner if it is dropped
/// while the callback is still running.
struct Shared {
    name: Mutex<String>,
    /// Written once by the trampoline before the startup handshake completes.
    os_id: OnceLock<u64>,
    /// Taken exactly once by the trampoline.
    callback: Mutex<Option<Callback>>,
    startup: Semaphore,
}

impl Shared {
    fn name(&self) -> MutexGuard<'_, String> {
        self.name.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_callback(&self) -> Option<Callback> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn os_id(&self) -> u64 {
        self.os_id.get().copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// ThreadRef
// ---------------------------------------------------------------------------

/// A shared view of a managed thread's identity.
///
/// Returned by [`Thread::current`] on a managed thread and by
/// [`Thread::handle`] on the owner side. Two `ThreadRef`s compare equal when
/// they refer to the same managed thread.
#[derive(Clone)]
pub struct ThreadRef {
    shared: Arc<Shared>,
}

impl ThreadRef {
    /// OS thread id of the managed thread.
    pub fn id(&self) -> u64 {
        self.shared.os_id()
    }

    /// Current display name (the full name, never truncated).
    pub fn name(&self) -> String {
        self.shared.name().clone()
    }

    /// Whether this refers to the thread owned by `thread`.
    pub fn is(&self, thread: &Thread) -> bool {
        Arc::ptr_eq(&self.shared, &thread.shared)
    }

    pub(crate) fn set_name(&self, name: &str) {
        *self.shared.name() = name.to_string();
    }
}

impl PartialEq for ThreadRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for ThreadRef {}

impl PartialEq<Thread> for ThreadRef {
    fn eq(&self, other: &Thread) -> bool {
        self.is(other)
    }
}

impl fmt::Debug for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadRef")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

/// A named native thread.
///
/// Construction does not return until the new thread has recorded its OS id,
/// registered its name and installed itself in its per-thread context. The
/// callback starts only after that handshake, and may still be running when
/// construction returns.
///
/// A `Thread` that is dropped without being joined detaches its native
/// thread: the callback runs to completion on its own and the OS reclaims the
/// thread afterwards.
pub struct Thread {
    shared: Arc<Shared>,
    /// `Some` until joined or detached.
    native: Option<NativeThread>,
}

impl Thread {
    /// Spawn a thread named `name` running `f`.
    ///
    /// An empty `name` is replaced with `"UNKNOWN"`, and that replacement is
    /// also the name carried by a [`ThreadError::Creation`] if spawning fails.
    pub fn new<F>(f: F, name: impl Into<String>) -> ThreadResult<Thread>
    where
        F: FnOnce() + Send + 'static,
    {
        Builder::new().name(name).spawn(f)
    }

    pub(crate) fn spawn_boxed(
        name: String,
        stack_size: Option<usize>,
        f: Callback,
    ) -> ThreadResult<Thread> {
        let name = if name.is_empty() {
            UNKNOWN_NAME.to_string()
        } else {
            name
        };

        let shared = Arc::new(Shared {
            name: Mutex::new(name.clone()),
            os_id: OnceLock::new(),
            callback: Mutex::new(Some(f)),
            startup: Semaphore::new(0),
        });

        thread_trace!(name = %name, "spawning managed thread");

        // The native thread owns this reference from here on.
        let arg = Arc::into_raw(Arc::clone(&shared)) as *mut c_void;

        // SAFETY: `trampoline` reclaims `arg` with `Arc::from_raw`, exactly once.
        let native = match unsafe { NativeThread::spawn(trampoline, arg, stack_size) } {
            Ok(native) => native,
            Err(code) => {
                // SAFETY: the thread was never created, so the reference is still ours.
                drop(unsafe { Arc::from_raw(arg as *const Shared) });
                tracing::error!(code, name = %name, "pthread_create failed");
                return Err(ThreadError::Creation { code, name });
            }
        };

        shared.startup.wait();

        thread_trace!(thread_id = shared.os_id(), name = %name, "managed thread started");

        Ok(Thread {
            shared,
            native: Some(native),
        })
    }

    /// The managed thread running on the calling native thread, or `None` if
    /// the caller was not spawned through [`Thread`].
    pub fn current() -> Option<ThreadRef> {
        context::current()
    }

    /// Display name of the calling thread, `"UNKNOWN"` if never set.
    pub fn current_name() -> String {
        context::name()
    }

    /// Rename the calling thread. Empty names are ignored.
    ///
    /// If the caller is a managed thread its stored [`name`](Thread::name) is
    /// updated too. The OS-visible name is left as it was at spawn.
    pub fn set_current_name(name: &str) {
        context::set_name(name);
    }

    /// OS thread id of the spawned thread. Never zero once construction has
    /// returned.
    pub fn id(&self) -> u64 {
        self.shared.os_id()
    }

    /// Display name of the spawned thread.
    pub fn name(&self) -> String {
        self.shared.name().clone()
    }

    /// Whether the native thread is still waiting to be joined.
    pub fn is_joinable(&self) -> bool {
        self.native.is_some()
    }

    /// A shared view of this thread's identity.
    pub fn handle(&self) -> ThreadRef {
        ThreadRef {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Block until the thread terminates.
    ///
    /// Joining an already joined thread is a no-op. If the OS refuses the join
    /// the handle is kept, and dropping the `Thread` later detaches it.
    pub fn join(&mut self) -> ThreadResult<()> {
        let Some(native) = self.native.take() else {
            return Ok(());
        };

        thread_trace!(thread_id = self.id(), "joining thread");

        match native.join() {
            Ok(()) => {
                thread_trace!(thread_id = self.id(), "joined thread");
                Ok(())
            }
            Err((native, code)) => {
                let name = self.name();
                tracing::error!(code, thread_id = self.id(), name = %name, "pthread_join failed");
                self.native = Some(native);
                Err(ThreadError::Join { code, name })
            }
        }
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        if let Some(native) = self.native.take() {
            thread_trace!(thread_id = self.id(), "detaching unjoined thread on drop");

            if let Err(code) = native.detach() {
                tracing::warn!(
                    code,
                    thread_id = self.id(),
                    name = %self.name(),
                    "pthread_detach failed"
                );
            }
        }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("joinable", &self.is_joinable())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Trampoline
// ---------------------------------------------------------------------------

/// Entry point of every managed native thread.
///
/// Installs the thread's identity, releases the spawning thread, then runs the
/// callback. A panic in the callback is caught here since it must not unwind
/// into the C runtime.
extern "C" fn trampoline(arg: *mut c_void) -> *mut c_void {
    // SAFETY: `arg` is the reference leaked by `Thread::spawn_boxed` for us.
    let shared = unsafe { Arc::from_raw(arg as *const Shared) };

    let name = shared.name().clone();
    context::enter(
        ThreadRef {
            shared: Arc::clone(&shared),
        },
        name.clone(),
    );

    let os_id = sys::current_thread_id();
    // This thread is the only writer, so the slot is still empty.
    let _ = shared.os_id.set(os_id);

    if let Err(err) = sys::set_current_os_name(&name) {
        tracing::warn!(thread_id = os_id, name = %name, %err, "could not set OS thread name");
    }

    let callback = shared.take_callback();
    shared.startup.notify();

    if let Some(callback) = callback
        && let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback))
    {
        tracing::error!(
            thread_id = os_id,
            name = %Thread::current_name(),
            panic = panic_message(payload.as_ref()),
            "thread callback panicked"
        );
    }

    thread_trace!(thread_id = os_id, "thread finished");
    ptr::null_mut()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic payload>"
    }
}
