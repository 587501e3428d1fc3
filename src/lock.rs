//! Lock helpers that recover from poisoning.
//!
//! Shared state here is only ever replaced wholesale, so a panic while a lock
//! was held cannot leave a half-written value behind.  Recovering the guard
//! is therefore safe; we just note it.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn recovered<G>(poisoned: PoisonError<G>, op: &'static str) -> G {
    tracing::warn!(op, "recovered from poisoned lock");
    poisoned.into_inner()
}

pub(crate) fn rw_read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|p| recovered(p, op))
}

pub(crate) fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|p| recovered(p, op))
}

pub(crate) fn mutex_lock<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|p| recovered(p, op))
}
