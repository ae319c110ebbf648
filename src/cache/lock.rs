use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

const SOURCE: &str = "murmur::cache::lock";

/// Take the guard even when a panicking holder poisoned the lock.
fn recover<G>(result: LockResult<G>, op: &'static str, lock_kind: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target = SOURCE,
            op,
            lock_kind,
            result = "poisoned_recovered",
            "Recovered from poisoned feed cache lock"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), op, "rwlock.read")
}

pub(crate) fn write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), op, "rwlock.write")
}
