//! Key/value store contract (spec.md §6).
//!
//! A thin wrapper over `redis::aio::ConnectionManager` exposing exactly the
//! operation set the lock store, idempotency cache and fraud engine need:
//! set-if-absent with TTL, conditional delete on value match, get,
//! set-with-TTL, increment with TTL, sorted-set add/range/trim with TTL, and
//! set-add/cardinality with TTL. No pack repo uses Redis, so this module has
//! no direct teacher file to generalize from; it is built straight from the
//! contract in spec.md §6, in the same "one small wrapper struct, async
//! methods returning `Result<_, KernelError>`" shape the teacher uses for
//! `db::Database`.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::KernelError;

#[derive(Clone)]
pub struct KvStore {
    conn: ConnectionManager,
}

impl KvStore {
    pub async fn connect(redis_url: &str) -> Result<Self, KernelError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(KvStore { conn })
    }

    /// `SET key value NX EX ttl_seconds`. Returns true if the key was set
    /// (i.e. it was previously absent).
    pub async fn set_nx_ex(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<bool, KernelError> {
        let mut conn = self.conn.clone();
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;
        Ok(result.is_some())
    }

    /// Delete `key` only if its current value equals `expected`. Implemented
    /// as a Lua script so the compare-and-delete is atomic — the classic
    /// Redis-lock release pattern: an acquirer must never delete a lock it
    /// does not own.
    pub async fn del_if_eq(&self, key: &str, expected: &str) -> Result<bool, KernelError> {
        const SCRIPT: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;
        let mut conn = self.conn.clone();
        let deleted: i32 = redis::Script::new(SCRIPT)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, KernelError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), KernelError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// Increment `key` by 1 and (re)set its TTL, returning the new count.
    pub async fn incr_ex(&self, key: &str, ttl_seconds: u64) -> Result<i64, KernelError> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.incr(key, 1).await?;
        let _: () = conn.expire(key, ttl_seconds as i64).await?;
        Ok(count)
    }

    /// `ZADD key score member`, then trim to the most recent `max_len`
    /// members and refresh the TTL. Used for the bounded sorted window the
    /// amount-anomaly rule keeps per sender.
    pub async fn zadd_trim_ex(
        &self,
        key: &str,
        score: f64,
        member: &str,
        max_len: isize,
        ttl_seconds: u64,
    ) -> Result<(), KernelError> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(key, member, score).await?;
        let _: () = conn.zremrangebyrank(key, 0, -(max_len + 1)).await?;
        let _: () = conn.expire(key, ttl_seconds as i64).await?;
        Ok(())
    }

    /// All members of the sorted set, ascending by score.
    pub async fn zrange(&self, key: &str) -> Result<Vec<String>, KernelError> {
        let mut conn = self.conn.clone();
        Ok(conn.zrange(key, 0, -1).await?)
    }

    /// `SADD key member`, refresh TTL, return the new set cardinality.
    pub async fn sadd_card_ex(
        &self,
        key: &str,
        member: &str,
        ttl_seconds: u64,
    ) -> Result<i64, KernelError> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(key, member).await?;
        let _: () = conn.expire(key, ttl_seconds as i64).await?;
        let card: i64 = conn.scard(key).await?;
        Ok(card)
    }

    /// Unconditional delete, used for read-cache invalidation fan-out.
    pub async fn del(&self, key: &str) -> Result<(), KernelError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), KernelError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> KvStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        KvStore::connect(&url).await.expect("failed to connect to Redis")
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn set_nx_ex_only_sets_once() {
        let store = test_store().await;
        let key = "test:kvstore:nx";
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut store.conn.clone())
            .await
            .unwrap();
        assert!(store.set_nx_ex(key, "tok1", 5).await.unwrap());
        assert!(!store.set_nx_ex(key, "tok2", 5).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn del_if_eq_only_deletes_matching_value() {
        let store = test_store().await;
        let key = "test:kvstore:cas";
        store.set_ex(key, "owner-token", 5).await.unwrap();
        assert!(!store.del_if_eq(key, "wrong-token").await.unwrap());
        assert!(store.del_if_eq(key, "owner-token").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn sadd_card_ex_counts_distinct_members() {
        let store = test_store().await;
        let key = "test:kvstore:sadd";
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut store.conn.clone())
            .await
            .unwrap();
        assert_eq!(store.sadd_card_ex(key, "a", 60).await.unwrap(), 1);
        assert_eq!(store.sadd_card_ex(key, "a", 60).await.unwrap(), 1);
        assert_eq!(store.sadd_card_ex(key, "b", 60).await.unwrap(), 2);
    }
}
