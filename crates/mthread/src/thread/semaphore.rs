//! Counting semaphore used for the spawn handshake.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A counting semaphore built on a `Mutex`/`Condvar` pair.
///
/// `wait` blocks while the count is zero and then decrements it; `notify`
/// increments it and wakes one waiter. No user code runs while the inner lock
/// is held, so a poisoned lock still carries a valid count and is recovered.
#[derive(Debug, Default)]
pub struct Semaphore {
    count: Mutex<u32>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `count` permits.
    pub const fn new(count: u32) -> Self {
        Self {
            count: Mutex::new(count),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking until one is available.
    pub fn wait(&self) {
        let mut count = self.lock();
        while *count == 0 {
            count = self
                .available
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
    }

    /// Take one permit if one is available right now.
    pub fn try_wait(&self) -> bool {
        let mut count = self.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Release one permit and wake a single waiter.
    pub fn notify(&self) {
        let mut count = self.lock();
        *count = count.saturating_add(1);
        drop(count);
        self.available.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, u32> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
