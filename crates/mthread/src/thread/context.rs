//! Per-thread context: the calling thread's managed handle and display name.
//!
//! Both slots are `thread_local!`, so every accessor here reads or writes the
//! slot of the thread that calls it. There is no path to another thread's
//! slot.

use std::cell::RefCell;

use super::handle::ThreadRef;
use super::UNKNOWN_NAME;

thread_local! {
    /// Handle of the managed thread running on this native thread, if any.
    static CURRENT: RefCell<Option<ThreadRef>> = const { RefCell::new(None) };

    /// Display name of this thread. `None` reads as [`UNKNOWN_NAME`].
    static CURRENT_NAME: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Register `thread` as the calling thread's managed handle.
///
/// Called once, by the trampoline, before the user callback runs.
pub(crate) fn enter(thread: ThreadRef, name: String) {
    CURRENT.with(|current| *current.borrow_mut() = Some(thread));
    CURRENT_NAME.with(|slot| *slot.borrow_mut() = Some(name));
}

pub(crate) fn current() -> Option<ThreadRef> {
    CURRENT.with(|current| current.borrow().clone())
}

pub(crate) fn name() -> String {
    CURRENT_NAME.with(|slot| {
        slot.borrow()
            .clone()
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    })
}

/// Rename the calling thread. Empty names are ignored.
///
/// The managed handle's stored name follows the context name so that the
/// owner and the thread itself agree on the label.
pub(crate) fn set_name(name: &str) {
    if name.is_empty() {
        return;
    }
    if let Some(thread) = current() {
        thread.set_name(name);
    }
    CURRENT_NAME.with(|slot| *slot.borrow_mut() = Some(name.to_string()));
}
