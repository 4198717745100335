//! Idempotency Cache (spec.md §4.3).
//!
//! Advisory fast path only: the durable guarantee against double-write is
//! the `transactions.idempotency_key` unique constraint (§14 supplemental
//! feature), grounded on the teacher's `TransferDb::create`
//! get-by-cid-before-insert idiom. This cache just saves a round trip to
//! Postgres on replay and lets the orchestrator skip lock acquisition
//! entirely on a hit.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::KernelError;
use crate::kvstore::KvStore;

pub struct IdempotencyCache {
    kv: KvStore,
}

fn cache_key(idempotency_key: &str) -> String {
    format!("idempotency:{idempotency_key}")
}

impl IdempotencyCache {
    pub fn new(kv: KvStore) -> Self {
        IdempotencyCache { kv }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<T>, KernelError> {
        match self.kv.get(&cache_key(idempotency_key)).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| KernelError::unexpected("unknown", e))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(
        &self,
        idempotency_key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> Result<(), KernelError> {
        let raw = serde_json::to_string(value).map_err(|e| KernelError::unexpected("unknown", e))?;
        self.kv
            .set_ex(&cache_key(idempotency_key), &raw, ttl_seconds)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        n: i32,
    }

    async fn test_cache() -> IdempotencyCache {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let kv = KvStore::connect(&url).await.expect("failed to connect to Redis");
        IdempotencyCache::new(kv)
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn set_then_get_round_trips() {
        let cache = test_cache().await;
        let key = "test:idempotency:roundtrip";
        cache.set(key, &Sample { n: 42 }, 5).await.unwrap();
        let got: Option<Sample> = cache.get(key).await.unwrap();
        assert_eq!(got, Some(Sample { n: 42 }));
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn miss_returns_none() {
        let cache = test_cache().await;
        let got: Option<Sample> = cache.get("test:idempotency:never-set").await.unwrap();
        assert_eq!(got, None);
    }
}
