//! Named native threads for building higher-level concurrency on.
//!
//! This crate provides:
//! - [`Thread`]: a POSIX thread with a display name, an OS-visible name and a
//!   spawn handshake that makes its identity readable before `new` returns
//! - Per-thread context queries ([`Thread::current`], [`Thread::current_name`])
//! - Join-or-detach lifecycle: an unjoined `Thread` detaches on drop
//! - A counting [`Semaphore`]
//! - A C FFI surface in [`thread::ffi`]
//!
//! ```no_run
//! use mthread::Thread;
//!
//! let mut worker = Thread::new(|| {
//!     assert_eq!(Thread::current_name(), "worker");
//! }, "worker")?;
//! assert_ne!(worker.id(), 0);
//! worker.join()?;
//! # Ok::<(), mthread::ThreadError>(())
//! ```

pub mod error;
pub mod thread;

pub use error::{ThreadError, ThreadResult};
pub use thread::sys::current_thread_id;
pub use thread::{Builder, Semaphore, Thread, ThreadRef, UNKNOWN_NAME};
