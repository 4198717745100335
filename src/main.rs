//! ledgerflow — payment orchestration kernel entry point.
//!
//! Wires config, logging, the Postgres pool (with the per-connection
//! bootstrap hook), the Redis connection manager, the Kafka producer, the
//! fraud engine, and the transfer orchestrator, then serves the gateway's
//! HTTP surface.

use std::sync::Arc;

use ledgerflow::account::{Account, AccountRepository, AccountStatus};
use ledgerflow::config::AppConfig;
use ledgerflow::db::Database;
use ledgerflow::events::EventPublisher;
use ledgerflow::fraud::FraudEngine;
use ledgerflow::gateway::{self, state::AppState};
use ledgerflow::idempotency::IdempotencyCache;
use ledgerflow::kvstore::KvStore;
use ledgerflow::lock::LockStore;
use ledgerflow::logging;
use ledgerflow::money::MinorUnits;
use ledgerflow::transfer::TransferOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = logging::init_logging(&config);

    tracing::info!("starting ledgerflow payment orchestration kernel");

    let db = Arc::new(Database::connect(&config).await?);
    db.ensure_schema().await?;

    let kv = KvStore::connect(&config.redis_url).await?;
    let lock_store = LockStore::new(kv.clone());
    let idempotency = IdempotencyCache::new(kv.clone());
    let config = Arc::new(config);
    let fraud = FraudEngine::new(kv.clone(), config.clone());
    let publisher = EventPublisher::new(&config.kafka_brokers)?;

    let orchestrator = TransferOrchestrator::new(
        db.clone(),
        lock_store,
        idempotency,
        fraud,
        publisher,
        kv.clone(),
        config.clone(),
    );

    let state = Arc::new(AppState {
        orchestrator,
        db,
        kv,
        config: config.clone(),
    });

    // Demonstration seed data is intentionally not created here — account
    // provisioning belongs to an out-of-scope collaborator (spec.md §1).
    // `ensure_demo_accounts` exists only for local/manual smoke testing.
    if std::env::var("LEDGERFLOW_SEED_DEMO_ACCOUNTS").is_ok() {
        ensure_demo_accounts(&state.db).await?;
    }

    gateway::serve(state, config.http_port).await?;
    Ok(())
}

/// Creates two demo accounts with fixed, well-known UUIDs if they don't
/// already exist — convenience for exercising the API by hand against a
/// fresh database. Not part of the core pipeline.
async fn ensure_demo_accounts(db: &Database) -> anyhow::Result<()> {
    use chrono::Utc;
    use uuid::Uuid;

    let demo_user = Uuid::parse_str("00000000-0000-0000-0000-000000000001")?;
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(demo_user)
        .execute(db.pool())
        .await?;

    let demo_accounts = [
        Uuid::parse_str("00000000-0000-0000-0000-0000000000a1")?,
        Uuid::parse_str("00000000-0000-0000-0000-0000000000a2")?,
    ];

    for id in demo_accounts {
        if AccountRepository::find_by_id(db.pool(), id).await?.is_some() {
            continue;
        }
        let now = Utc::now();
        let account = Account {
            id,
            user_id: demo_user,
            balance: MinorUnits::from_i64(10_000_00),
            currency: "INR".to_string(),
            status: AccountStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        AccountRepository::create(db.pool(), &account).await?;
    }

    Ok(())
}
