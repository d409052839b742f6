//! Extension trait to ignore mutex poisoning.
//!
//! The mutexes in this crate guard plain `Copy` state values that a
//! panicking worker cannot leave half-written, so a poisoned lock is still safe to read.

use std::sync::{Mutex, MutexGuard};

pub trait IgnorePoison<T> {
    /// Locks the mutex, recovering the guard if another thread panicked while holding it.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnorePoison<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}
