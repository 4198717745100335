//! End-to-end scenarios for the transfer pipeline (spec.md §8 S1-S6).
//!
//! These exercise `TransferOrchestrator` against real Postgres, Redis and
//! Kafka instances, so they're `#[ignore]`d by default — run with
//! `cargo test --test transfer_scenarios -- --ignored` against a live stack
//! (`DATABASE_URL`, `REDIS_URL`, `KAFKA_BROKERS`).

use std::sync::Arc;

use chrono::Utc;
use ledgerflow::account::{Account, AccountRepository, AccountStatus};
use ledgerflow::config::AppConfig;
use ledgerflow::db::Database;
use ledgerflow::error::KernelError;
use ledgerflow::events::EventPublisher;
use ledgerflow::fraud::FraudEngine;
use ledgerflow::idempotency::IdempotencyCache;
use ledgerflow::kvstore::KvStore;
use ledgerflow::lock::LockStore;
use ledgerflow::money::MinorUnits;
use ledgerflow::transfer::{InitiateTransferParams, TransferOrchestrator};
use uuid::Uuid;

struct Harness {
    orchestrator: TransferOrchestrator,
    db: Arc<Database>,
}

async fn harness() -> Harness {
    let config = Arc::new(AppConfig::from_env().expect("AppConfig::from_env"));
    let db = Arc::new(Database::connect(&config).await.expect("db connect"));
    db.ensure_schema().await.expect("ensure_schema");

    let kv = KvStore::connect(&config.redis_url).await.expect("kv connect");
    let lock_store = LockStore::new(kv.clone());
    let idempotency = IdempotencyCache::new(kv.clone());
    let fraud = FraudEngine::new(kv.clone(), config.clone());
    let publisher = EventPublisher::new(&config.kafka_brokers).expect("kafka producer");

    let orchestrator = TransferOrchestrator::new(
        db.clone(),
        lock_store,
        idempotency,
        fraud,
        publisher,
        kv,
        config,
    );

    Harness { orchestrator, db }
}

/// Inserts a fresh account with a fixed balance, owned by a fresh user.
async fn seed_account(db: &Database, balance_minor: i64) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id) VALUES ($1)")
        .bind(user_id)
        .execute(db.pool())
        .await
        .expect("insert user");

    let id = Uuid::new_v4();
    let now = Utc::now();
    let account = Account {
        id,
        user_id,
        balance: MinorUnits::from_i64(balance_minor),
        currency: "INR".to_string(),
        status: AccountStatus::Active,
        version: 0,
        created_at: now,
        updated_at: now,
    };
    AccountRepository::create(db.pool(), &account)
        .await
        .expect("create account");
    id
}

fn params(
    idempotency_key: &str,
    from: Uuid,
    to: Uuid,
    amount_minor: i64,
) -> InitiateTransferParams {
    InitiateTransferParams {
        idempotency_key: idempotency_key.to_string(),
        from_account_id: from,
        to_account_id: to,
        amount: MinorUnits::from_i64(amount_minor),
        currency: "INR".to_string(),
        description: None,
        user_id: Uuid::new_v4(),
        trace_id: Uuid::new_v4().to_string(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL, Redis and Kafka"]
async fn s1_happy_path_moves_balance_and_writes_ledger() {
    let h = harness().await;
    let a = seed_account(&h.db, 1_000_000).await;
    let b = seed_account(&h.db, 200_000).await;

    let (result, outcome) = h
        .orchestrator
        .initiate_transfer(params("s1-happy-path", a, b, 50_000))
        .await
        .expect("transfer should succeed");

    assert_eq!(outcome.status_code(), 201);
    assert_eq!(result.transfer.status.as_str(), "completed");
    assert_eq!(result.ledger_entries.len(), 2);
    assert!(!result.replayed);

    let sender = AccountRepository::find_by_id(h.db.pool(), a)
        .await
        .unwrap()
        .unwrap();
    let recipient = AccountRepository::find_by_id(h.db.pool(), b)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sender.balance.get(), 950_000);
    assert_eq!(sender.version, 1);
    assert_eq!(recipient.balance.get(), 250_000);
    assert_eq!(recipient.version, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL, Redis and Kafka"]
async fn s2_replay_returns_identical_result_without_mutating_balances() {
    let h = harness().await;
    let a = seed_account(&h.db, 1_000_000).await;
    let b = seed_account(&h.db, 200_000).await;
    let key = "s2-replay";

    let (first, _) = h
        .orchestrator
        .initiate_transfer(params(key, a, b, 50_000))
        .await
        .expect("first attempt succeeds");

    let (second, outcome) = h
        .orchestrator
        .initiate_transfer(params(key, a, b, 50_000))
        .await
        .expect("replay succeeds");

    assert_eq!(outcome.status_code(), 200);
    assert!(second.replayed);
    assert_eq!(second.transfer.id, first.transfer.id);

    let sender = AccountRepository::find_by_id(h.db.pool(), a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sender.balance.get(), 950_000, "replay must not debit twice");
    assert_eq!(sender.version, 1, "replay must not bump version again");
}

#[tokio::test]
#[ignore = "requires PostgreSQL, Redis and Kafka"]
async fn s3_insufficient_funds_leaves_balances_untouched() {
    let h = harness().await;
    let a = seed_account(&h.db, 10_000).await;
    let b = seed_account(&h.db, 0).await;

    let err = h
        .orchestrator
        .initiate_transfer(params("s3-insufficient", a, b, 20_000))
        .await
        .expect_err("should fail with insufficient funds");

    assert!(matches!(err, KernelError::InsufficientFunds { .. }), "{err:?}");

    let sender = AccountRepository::find_by_id(h.db.pool(), a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sender.balance.get(), 10_000);
}

#[tokio::test]
#[ignore = "requires PostgreSQL, Redis and Kafka"]
async fn s5_self_transfer_is_rejected_before_any_lock() {
    let h = harness().await;
    let a = seed_account(&h.db, 100_000).await;

    let err = h
        .orchestrator
        .initiate_transfer(params("s5-self", a, a, 1_000))
        .await
        .expect_err("self transfer must be rejected");

    assert!(matches!(err, KernelError::Validation(_)), "{err:?}");
}

#[tokio::test]
#[ignore = "requires PostgreSQL, Redis and Kafka"]
async fn s6_concurrent_transfer_from_same_sender_is_serialized() {
    let h = harness().await;
    let a = seed_account(&h.db, 100_000).await;
    let b = seed_account(&h.db, 0).await;
    let c = seed_account(&h.db, 0).await;

    let first = h
        .orchestrator
        .initiate_transfer(params("s6-first", a, b, 40_000));
    let second = h
        .orchestrator
        .initiate_transfer(params("s6-second", a, c, 40_000));

    let (first, second) = tokio::join!(first, second);

    let outcomes = [first, second];
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    let busy = outcomes
        .iter()
        .filter(|r| matches!(r, Err(KernelError::Busy)))
        .count();

    assert_eq!(succeeded, 1, "at most one of two racing senders should win the lock race here");
    assert_eq!(busy, 1);
}
