use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock ignoring poisoning: every critical section in this crate is a plain field swap.
#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
