//! Distributed Lock Store (spec.md §4.2).
//!
//! Short-lived per-account locks with deadlock-free paired acquisition: sort
//! the two account IDs lexicographically, then acquire both in that order, so
//! any two concurrent transfers touching the same unordered pair of accounts
//! always take the locks in the same global order — no AB/BA deadlock.
//! Acquire failure is fast (no blocking wait); lock-store unavailability
//! fails the request outright (no fail-open — locks are correctness
//! critical, per Open Question 3).

use rand::Rng;
use std::time::Duration;

use crate::error::KernelError;
use crate::kvstore::KvStore;

/// Proof of ownership for a single acquired lock, needed to release it
/// without deleting a lock acquired by someone else in the meantime.
#[derive(Debug, Clone)]
pub struct LockHandle {
    key: String,
    token: String,
}

pub struct LockStore {
    kv: KvStore,
}

impl LockStore {
    pub fn new(kv: KvStore) -> Self {
        LockStore { kv }
    }

    fn lock_key(account_id: &str) -> String {
        format!("lock:account:{account_id}")
    }

    fn random_token() -> String {
        let mut rng = rand::thread_rng();
        let bytes: [u8; 16] = rng.r#gen();
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Acquire locks on both accounts, in sorted order, each with the given
    /// TTL. Returns `Ok(None)` if either acquisition failed (the first lock,
    /// if it was taken, is released before returning) — the caller maps this
    /// to a "busy" (409-class) error. Returns `Err` only on lock-store
    /// unavailability.
    pub async fn acquire_pair(
        &self,
        account_a: &str,
        account_b: &str,
        ttl: Duration,
    ) -> Result<Option<(LockHandle, LockHandle)>, KernelError> {
        let (first, second) = if account_a <= account_b {
            (account_a, account_b)
        } else {
            (account_b, account_a)
        };

        let ttl_seconds = ttl.as_secs().max(1);

        let first_token = Self::random_token();
        let first_key = Self::lock_key(first);
        if !self
            .kv
            .set_nx_ex(&first_key, &first_token, ttl_seconds)
            .await?
        {
            return Ok(None);
        }
        let first_handle = LockHandle {
            key: first_key,
            token: first_token,
        };

        let second_token = Self::random_token();
        let second_key = Self::lock_key(second);
        if !self
            .kv
            .set_nx_ex(&second_key, &second_token, ttl_seconds)
            .await?
        {
            self.release(&first_handle).await?;
            return Ok(None);
        }
        let second_handle = LockHandle {
            key: second_key,
            token: second_token,
        };

        Ok(Some((first_handle, second_handle)))
    }

    /// Compare-and-delete using the held token, so a stale or already-expired
    /// handle never deletes a lock some other acquirer now owns.
    pub async fn release(&self, handle: &LockHandle) -> Result<(), KernelError> {
        self.kv.del_if_eq(&handle.key, &handle.token).await?;
        Ok(())
    }

    pub async fn release_pair(
        &self,
        handles: &(LockHandle, LockHandle),
    ) -> Result<(), KernelError> {
        // Release in reverse-acquisition order; harmless either way since
        // the token guard makes release idempotent per-lock, but symmetric
        // teardown reads more naturally in logs.
        self.release(&handles.1).await?;
        self.release(&handles.0).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> LockStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let kv = KvStore::connect(&url).await.expect("failed to connect to Redis");
        LockStore::new(kv)
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn acquires_locks_in_canonical_order_regardless_of_call_order() {
        let store = test_store().await;
        let a = "11111111-0000-0000-0000-000000000000";
        let b = "22222222-0000-0000-0000-000000000000";

        let h1 = store
            .acquire_pair(a, b, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(h1.is_some());
        store.release_pair(&h1.unwrap()).await.unwrap();

        let h2 = store
            .acquire_pair(b, a, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(h2.is_some());
        store.release_pair(&h2.unwrap()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn second_acquire_on_held_pair_fails_fast() {
        let store = test_store().await;
        let a = "33333333-0000-0000-0000-000000000000";
        let b = "44444444-0000-0000-0000-000000000000";

        let first = store
            .acquire_pair(a, b, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .acquire_pair(a, b, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(second.is_none());

        store.release_pair(&first.unwrap()).await.unwrap();
    }
}
