//! Managed native threads with a startup handshake.
//!
//! A [`Thread`] wraps one POSIX thread. Spawning blocks until the new thread
//! has recorded its OS id, registered its OS-visible name and installed
//! itself in its per-thread context, so the identity is readable as soon as
//! the constructor returns.
//!
//! ## Modules
//!
//! - [`handle`]: `Thread`/`ThreadRef`, the trampoline and join/detach
//! - [`builder`]: pre-spawn configuration (name, stack size)
//! - `context`: thread-local "current thread" and "current name" slots
//! - [`semaphore`]: counting semaphore used for the handshake
//! - [`sys`]: raw pthread, thread-id and thread-name calls
//! - [`ffi`]: C FFI surface

pub mod builder;
pub(crate) mod context;
pub mod ffi;
pub mod handle;
pub mod semaphore;
pub mod sys;

/// Name reported for threads that were never given one.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

pub use builder::Builder;
pub use handle::{Thread, ThreadRef};
pub use semaphore::Semaphore;
