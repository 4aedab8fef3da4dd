//! Per-session concurrency control.
//!
//! Each session is a single logical actor: at most one mutating operation
//! runs against it at a time, and the permit is held for the whole
//! operation including the provider call. Operations on different
//! sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use loom_domain::error::{Error, Result};

/// Manages per-session operation locks.
///
/// Each session id maps to a `Semaphore(1)`. Acquiring the permit gives
/// exclusive access for one operation; it auto-releases on drop.
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl Default for SessionLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the operation lock for a session, waiting if another
    /// operation is in flight.
    ///
    /// Idle entries are pruned on the way in, so the map stays bounded by
    /// the number of sessions with an operation in flight.
    pub async fn acquire(&self, session_id: &str) -> Result<OwnedSemaphorePermit> {
        let sem = {
            let mut locks = self.locks.lock();
            locks.retain(|_, sem| Arc::strong_count(sem) > 1);
            locks
                .entry(session_id.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };

        // The semaphore is never closed; this only fails on shutdown races.
        sem.acquire_owned()
            .await
            .map_err(|_| Error::Persistence("session lock closed".into()))
    }

    /// Number of tracked sessions (for monitoring).
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Drop lock entries for sessions with no operation in flight. The
    /// map's entry holds one reference; a permit or a queued waiter holds
    /// another, so only truly idle entries go.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, sem| Arc::strong_count(sem) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequential_access() {
        let map = SessionLockMap::new();

        let permit1 = map.acquire("s1").await.unwrap();
        drop(permit1);

        let permit2 = map.acquire("s1").await.unwrap();
        drop(permit2);
    }

    #[tokio::test]
    async fn different_sessions_concurrent() {
        let map = SessionLockMap::new();

        let p1 = map.acquire("s1").await.unwrap();
        let p2 = map.acquire("s2").await.unwrap();

        assert_eq!(map.session_count(), 2);

        drop(p1);
        drop(p2);
    }

    #[tokio::test]
    async fn same_session_waits() {
        let map = Arc::new(SessionLockMap::new());
        let map2 = map.clone();

        let p1 = map.acquire("s1").await.unwrap();

        let handle = tokio::spawn(async move {
            let _p2 = map2.acquire("s1").await.unwrap();
            42
        });

        // Give the waiter a moment to queue.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        drop(p1);

        let result = handle.await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn acquire_prunes_idle_entries() {
        let map = SessionLockMap::new();
        drop(map.acquire("a").await.unwrap());
        drop(map.acquire("b").await.unwrap());

        // Acquiring any session sweeps entries with nothing in flight.
        let p = map.acquire("c").await.unwrap();
        assert_eq!(map.session_count(), 1);
        drop(p);
    }

    #[tokio::test]
    async fn prune_drops_idle_entries() {
        let map = SessionLockMap::new();
        let p1 = map.acquire("held").await.unwrap();
        drop(map.acquire("idle").await.unwrap());

        map.prune_idle();
        assert_eq!(map.session_count(), 1);
        drop(p1);
    }
}
