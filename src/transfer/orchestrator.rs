//! Transfer Orchestrator (spec.md §4.6): the 17-step pipeline. Generalized
//! from the teacher's `internal_transfer` coordinator+db+types+adapters FSM
//! (a two-phase cross-service saga) into a single retried DB transaction,
//! because both legs of a transfer here live in the same Postgres database —
//! see DESIGN.md for why the Compensating/RolledBack states have no
//! counterpart in this crate.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::account::AccountRepository;
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::KernelError;
use crate::events::{EventPublisher, Topic};
use crate::fraud::{FraudContext, FraudEngine};
use crate::idempotency::IdempotencyCache;
use crate::kvstore::KvStore;
use crate::lock::{LockHandle, LockStore};
use crate::money::MinorUnits;

use super::ledger::{LedgerLeg, LedgerWriter};
use super::models::{LedgerEntryType, Transfer, TransferResult, TransferStatus};
use super::repository::TransferRepository;

const SUPPORTED_CURRENCY: &str = "INR";
const MAX_RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 100;

pub struct InitiateTransferParams {
    pub idempotency_key: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: MinorUnits,
    pub currency: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub trace_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Replayed,
}

impl Outcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Created => 201,
            Outcome::Replayed => 200,
        }
    }
}

pub struct TransferOrchestrator {
    db: Arc<Database>,
    lock_store: LockStore,
    idempotency: IdempotencyCache,
    fraud: FraudEngine,
    publisher: EventPublisher,
    cache_kv: KvStore,
    config: Arc<AppConfig>,
}

/// Outcome of one attempt at the retried DB transaction (step 7).
enum AttemptOutcome {
    Committed(TransferResult),
    Retry,
    /// The idempotency-key unique constraint fired: a racing duplicate
    /// request committed between this request's idempotency-cache probe
    /// and its own insert (spec.md §4.3's documented backstop). The caller
    /// looks the finished transfer up and returns it as a replay instead of
    /// surfacing an internal error for what is actually a successful retry
    /// of someone else's request.
    AlreadyCompleted,
}

/// Step 2: input validation (spec.md §4.6). Pure — no DB/Redis/Kafka
/// dependency — kept as a free function so it can be unit tested directly
/// against a plain `AppConfig`, matching the teacher's convention of
/// colocated unit tests for pure logic (`money.rs`, `fraud/rules.rs`).
fn validate_params(config: &AppConfig, params: &InitiateTransferParams) -> Result<(), KernelError> {
    if params.from_account_id == params.to_account_id {
        return Err(KernelError::Validation(
            "sender and recipient must differ".into(),
        ));
    }
    if params.currency != SUPPORTED_CURRENCY {
        return Err(KernelError::Validation(format!(
            "unsupported currency: {}",
            params.currency
        )));
    }
    let amount = params.amount.get();
    if amount < config.min_transfer_minor {
        return Err(KernelError::Validation(format!(
            "amount {amount} below minimum {}",
            config.min_transfer_minor
        )));
    }
    if amount > config.max_transfer_minor {
        return Err(KernelError::Validation(format!(
            "amount {amount} above maximum {}",
            config.max_transfer_minor
        )));
    }
    Ok(())
}

impl TransferOrchestrator {
    pub fn new(
        db: Arc<Database>,
        lock_store: LockStore,
        idempotency: IdempotencyCache,
        fraud: FraudEngine,
        publisher: EventPublisher,
        cache_kv: KvStore,
        config: Arc<AppConfig>,
    ) -> Self {
        TransferOrchestrator {
            db,
            lock_store,
            idempotency,
            fraud,
            publisher,
            cache_kv,
            config,
        }
    }

    /// Step 1–11: the full pipeline. Step 12 (best-effort `payment.failed`
    /// on unexpected failure) wraps everything from lock acquisition
    /// onward; fraud-blocked has already published its own event by the
    /// time it reaches that wrapper, so it is not double-published.
    pub async fn initiate_transfer(
        &self,
        params: InitiateTransferParams,
    ) -> Result<(TransferResult, Outcome), KernelError> {
        // Step 1: idempotency probe. The cache is advisory only (spec.md
        // §4.3) — unlike the lock store it has a durable backstop in the
        // `transactions.idempotency_key` unique constraint, so a probe
        // failure (e.g. Redis outage) is logged and treated as a miss
        // rather than failing the request.
        match self
            .idempotency
            .get::<TransferResult>(&params.idempotency_key)
            .await
        {
            Ok(Some(mut cached)) => {
                tracing::debug!(trace_id = %params.trace_id, idempotency_key = %params.idempotency_key, "idempotency cache hit, replaying");
                cached.replayed = true;
                return Ok((cached, Outcome::Replayed));
            }
            Ok(None) => {
                tracing::debug!(trace_id = %params.trace_id, idempotency_key = %params.idempotency_key, "idempotency cache miss");
            }
            Err(e) => {
                tracing::warn!(
                    trace_id = %params.trace_id,
                    error = %e,
                    "idempotency probe failed, proceeding as a miss"
                );
            }
        }

        // Step 2: input validation — no external side effects on failure.
        self.validate(&params)?;
        tracing::debug!(trace_id = %params.trace_id, from_account_id = %params.from_account_id, to_account_id = %params.to_account_id, amount = params.amount.get(), "validation passed");

        // Step 3: paired lock acquisition.
        let handles = self
            .lock_store
            .acquire_pair(
                &params.from_account_id.to_string(),
                &params.to_account_id.to_string(),
                self.config.lock_ttl(),
            )
            .await?
            .ok_or(KernelError::Busy)?;
        tracing::debug!(trace_id = %params.trace_id, from_account_id = %params.from_account_id, to_account_id = %params.to_account_id, "transfer lock pair acquired");

        let result = self.run_locked(&params).await;

        // Step 11: lock release, guaranteed regardless of outcome.
        match self.release_lock(&handles).await {
            Ok(()) => {
                tracing::debug!(trace_id = %params.trace_id, "transfer lock pair released");
            }
            Err(e) => {
                tracing::warn!(trace_id = %params.trace_id, error = %e, "failed to release transfer lock");
            }
        }

        match result {
            Ok((transfer_result, outcome)) => {
                // Step 8: idempotency cache set.
                if let Err(e) = self
                    .idempotency
                    .set(
                        &params.idempotency_key,
                        &transfer_result,
                        self.config.idempotency_ttl_seconds,
                    )
                    .await
                {
                    tracing::warn!(trace_id = %params.trace_id, error = %e, "idempotency cache set failed");
                } else {
                    tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_result.transfer.id, "idempotency cache set");
                }
                tracing::info!(trace_id = %params.trace_id, transfer_id = %transfer_result.transfer.id, outcome = ?outcome, "transfer pipeline finished");
                Ok((transfer_result, outcome))
            }
            Err(KernelError::FraudBlocked { score, signals }) => {
                // Already published payment.fraud_blocked inside run_locked.
                Err(KernelError::FraudBlocked { score, signals })
            }
            Err(err) => {
                // Step 12: best-effort payment.failed, reason propagated.
                self.publish_failed_best_effort(&params, &err).await;
                Err(err)
            }
        }
    }

    async fn release_lock(&self, handles: &(LockHandle, LockHandle)) -> Result<(), KernelError> {
        self.lock_store.release_pair(handles).await
    }

    fn validate(&self, params: &InitiateTransferParams) -> Result<(), KernelError> {
        validate_params(&self.config, params)
    }

    async fn run_locked(
        &self,
        params: &InitiateTransferParams,
    ) -> Result<(TransferResult, Outcome), KernelError> {
        // Step 4: pre-transaction account load.
        let sender = AccountRepository::find_by_id(self.db.pool(), params.from_account_id)
            .await?
            .ok_or_else(|| KernelError::NotFound(format!("account {}", params.from_account_id)))?;
        let _recipient = AccountRepository::find_by_id(self.db.pool(), params.to_account_id)
            .await?
            .ok_or_else(|| KernelError::NotFound(format!("account {}", params.to_account_id)))?;
        tracing::debug!(trace_id = %params.trace_id, from_account_id = %params.from_account_id, to_account_id = %params.to_account_id, "accounts loaded");

        // Step 5: fraud evaluation, using the pre-loaded sender account age.
        let now = Utc::now();
        let fraud_ctx = FraudContext {
            sender_id: params.from_account_id,
            recipient_id: params.to_account_id,
            amount: params.amount,
            sender_created_at: sender.created_at,
            now,
            region_utc_offset_minutes: self.config.region_utc_offset_minutes,
        };
        let fraud_result = self.fraud.evaluate(&fraud_ctx).await?;
        tracing::debug!(
            trace_id = %params.trace_id,
            score = fraud_result.score,
            action = fraud_result.action.as_str(),
            signal_count = fraud_result.signals.len(),
            "fraud evaluation complete"
        );

        // Step 6: decision gate.
        if fraud_result.action.blocks_transfer() {
            let signal_names: Vec<String> = fraud_result
                .signals
                .iter()
                .map(|s| s.rule_name.to_string())
                .collect();
            self.publisher
                .publish_best_effort(
                    Topic::PaymentFraudBlocked,
                    &params.trace_id,
                    serde_json::json!({
                        "idempotencyKey": params.idempotency_key,
                        "fromAccountId": params.from_account_id,
                        "toAccountId": params.to_account_id,
                        "amount": params.amount.get(),
                        "score": fraud_result.score,
                        "action": fraud_result.action.as_str(),
                        "signals": signal_names,
                    }),
                )
                .await;
            tracing::debug!(trace_id = %params.trace_id, score = fraud_result.score, action = fraud_result.action.as_str(), "payment.fraud_blocked published");
            return Err(KernelError::FraudBlocked {
                score: fraud_result.score,
                signals: signal_names,
            });
        }

        // Step 7: DB transaction, retried up to MAX_RETRY_ATTEMPTS times.
        let transfer_id = Uuid::new_v4();
        let mut last_err: Option<KernelError> = None;
        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, attempt, "db transaction attempt starting");
            match self
                .try_commit(params, transfer_id, &fraud_result, now)
                .await
            {
                Ok(AttemptOutcome::Committed(result)) => {
                    tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, attempt, "db transaction committed");
                    self.publish_completed_best_effort(params, &result).await;
                    return Ok((result, Outcome::Created));
                }
                Ok(AttemptOutcome::Retry) => {
                    tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, attempt, "concurrent modification, retrying");
                    last_err = Some(KernelError::ConcurrentModification);
                    if attempt < MAX_RETRY_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                            .await;
                    }
                }
                Ok(AttemptOutcome::AlreadyCompleted) => {
                    tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, attempt, "idempotency key already committed by a racing request, loading as replay");
                    return self.load_as_replay(params).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(KernelError::ConcurrentModification))
    }

    /// Looks up the transfer a racing duplicate already committed under this
    /// idempotency key and returns it as a replay (spec.md §4.3's durable
    /// backstop). No new event is published — the original committer already
    /// published `payment.completed`.
    async fn load_as_replay(
        &self,
        params: &InitiateTransferParams,
    ) -> Result<(TransferResult, Outcome), KernelError> {
        let transfer =
            TransferRepository::find_by_idempotency_key(self.db.pool(), &params.idempotency_key)
                .await?
                .ok_or_else(|| {
                    KernelError::unexpected(
                        params.trace_id.clone(),
                        anyhow::anyhow!(
                            "unique violation on idempotency key but no matching transfer found"
                        ),
                    )
                })?;
        let ledger_entries =
            TransferRepository::ledger_entries_for(self.db.pool(), transfer.id).await?;
        let fraud_signals = TransferRepository::fraud_signals_for(self.db.pool(), transfer.id).await?;
        Ok((
            TransferResult {
                transfer,
                ledger_entries,
                fraud_signals,
                replayed: true,
            },
            Outcome::Replayed,
        ))
    }

    async fn try_commit(
        &self,
        params: &InitiateTransferParams,
        transfer_id: Uuid,
        fraud_result: &crate::fraud::FraudResult,
        now: chrono::DateTime<Utc>,
    ) -> Result<AttemptOutcome, KernelError> {
        let mut tx = self.db.pool().begin().await?;

        // Step 7.1: row-level lock, both accounts, canonical (sorted) order.
        let (first_id, second_id) = if params.from_account_id <= params.to_account_id {
            (params.from_account_id, params.to_account_id)
        } else {
            (params.to_account_id, params.from_account_id)
        };

        let first = match AccountRepository::lock_for_update(&mut tx, first_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Err(KernelError::NotFound(format!("account {first_id}")));
            }
            Err(e) if AccountRepository::is_lock_not_available(&e) => {
                return Ok(AttemptOutcome::Retry);
            }
            Err(e) => return Err(KernelError::from(e)),
        };
        let second = match AccountRepository::lock_for_update(&mut tx, second_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Err(KernelError::NotFound(format!("account {second_id}")));
            }
            Err(e) if AccountRepository::is_lock_not_available(&e) => {
                return Ok(AttemptOutcome::Retry);
            }
            Err(e) => return Err(KernelError::from(e)),
        };

        let (sender, recipient) = if first.id == params.from_account_id {
            (first, second)
        } else {
            (second, first)
        };
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, sender = %sender.id, recipient = %recipient.id, "row locks acquired");

        // Step 7.2: re-check status.
        if !sender.is_active() {
            return Err(KernelError::FrozenAccount(sender.id.to_string()));
        }
        if !recipient.is_active() {
            return Err(KernelError::FrozenAccount(recipient.id.to_string()));
        }

        // Step 7.3: balance check.
        let sender_balance_after = sender.balance.checked_sub(params.amount).map_err(|_| {
            KernelError::InsufficientFunds {
                required: params.amount.get(),
                available: sender.balance.get(),
            }
        })?;
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, sender_balance_after = sender_balance_after.get(), "balance check passed");

        // Step 7.4: debit conditioned on observed version.
        let rows = AccountRepository::debit_if_version(
            &mut tx,
            sender.id,
            params.amount,
            sender.version,
            now,
        )
        .await?;
        if rows == 0 {
            return Ok(AttemptOutcome::Retry);
        }
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, sender = %sender.id, "sender debited");

        // Step 7.5: credit recipient unconditionally (row already held).
        let recipient_balance_after = recipient
            .balance
            .checked_add(params.amount)
            .map_err(|e| KernelError::Validation(e.to_string()))?;
        AccountRepository::credit(&mut tx, recipient.id, params.amount, now).await?;
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, recipient = %recipient.id, "recipient credited");

        // Step 7.6: insert transfer row.
        match TransferRepository::insert_completed(
            &mut tx,
            transfer_id,
            &params.idempotency_key,
            params.from_account_id,
            params.to_account_id,
            params.amount,
            &params.currency,
            fraud_result.score,
            fraud_result.action,
            params.description.as_deref(),
            &params.trace_id,
            now,
        )
        .await
        {
            Ok(()) => {
                tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, "transfer row inserted");
            }
            Err(e) if TransferRepository::is_unique_violation(&e) => {
                return Ok(AttemptOutcome::AlreadyCompleted);
            }
            Err(e) => return Err(KernelError::from(e)),
        }

        // Step 7.7: ledger pair.
        let debit_leg = LedgerLeg {
            account_id: sender.id,
            entry_type: LedgerEntryType::Debit,
            amount: params.amount,
            balance_before: sender.balance,
            balance_after: sender_balance_after,
        };
        let credit_leg = LedgerLeg {
            account_id: recipient.id,
            entry_type: LedgerEntryType::Credit,
            amount: params.amount,
            balance_before: recipient.balance,
            balance_after: recipient_balance_after,
        };
        let (debit_entry, credit_entry) =
            LedgerWriter::write_pair(&mut tx, transfer_id, debit_leg, credit_leg, now).await?;
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, "ledger pair written");

        // Step 7.8: fraud-signal audit rows.
        TransferRepository::insert_fraud_signals(&mut tx, transfer_id, &fraud_result.signals, now)
            .await?;
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, signal_count = fraud_result.signals.len(), "fraud signal rows inserted");

        // Step 7.9: commit.
        tx.commit().await?;
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %transfer_id, "transaction committed");

        let transfer = Transfer {
            id: transfer_id,
            idempotency_key: params.idempotency_key.clone(),
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            currency: params.currency.clone(),
            status: TransferStatus::Completed,
            failure_reason: None,
            fraud_score: fraud_result.score,
            fraud_action: fraud_result.action,
            description: params.description.clone(),
            trace_id: params.trace_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let fraud_signal_records = fraud_result
            .signals
            .iter()
            .map(|s| crate::transfer::models::FraudSignalRecord {
                id: Uuid::new_v4(),
                transfer_id,
                rule_name: s.rule_name.to_string(),
                points: s.points,
                context: s.context.clone(),
                created_at: now,
            })
            .collect();

        // Step 9: read-cache invalidation, fanned out in parallel and
        // awaited before returning. Only the unparameterized per-account
        // summary key is invalidated here — the paged transaction/ledger
        // list caches carry their own short TTLs and are left to expire
        // naturally, which spec.md §6 leaves as an acceptable choice for a
        // cache explicitly documented as advisory.
        self.invalidate_account_caches(sender.id, recipient.id).await;

        Ok(AttemptOutcome::Committed(TransferResult {
            transfer,
            ledger_entries: vec![debit_entry, credit_entry],
            fraud_signals: fraud_signal_records,
            replayed: false,
        }))
    }

    async fn invalidate_account_caches(&self, account_a: Uuid, account_b: Uuid) {
        let (ra, rb) = tokio::join!(
            self.cache_kv.del(&format!("cache:stats:{account_a}")),
            self.cache_kv.del(&format!("cache:stats:{account_b}")),
        );
        if let Err(e) = ra {
            tracing::warn!(account = %account_a, error = %e, "cache invalidation failed");
        }
        if let Err(e) = rb {
            tracing::warn!(account = %account_b, error = %e, "cache invalidation failed");
        }
        tracing::debug!(account_a = %account_a, account_b = %account_b, "account stats cache invalidated");
    }

    async fn publish_completed_best_effort(
        &self,
        params: &InitiateTransferParams,
        result: &TransferResult,
    ) {
        self.publisher
            .publish(
                Topic::PaymentCompleted,
                &params.trace_id,
                serde_json::json!({
                    "transferId": result.transfer.id,
                    "fromAccountId": result.transfer.from_account_id,
                    "toAccountId": result.transfer.to_account_id,
                    "amount": result.transfer.amount.get(),
                    "fraudScore": result.transfer.fraud_score,
                    "fraudAction": result.transfer.fraud_action.as_str(),
                }),
                self.config.event_publish_await,
            )
            .await;
        tracing::debug!(trace_id = %params.trace_id, transfer_id = %result.transfer.id, "payment.completed published");
    }

    async fn publish_failed_best_effort(&self, params: &InitiateTransferParams, err: &KernelError) {
        self.publisher
            .publish_best_effort(
                Topic::PaymentFailed,
                &params.trace_id,
                serde_json::json!({
                    "idempotencyKey": params.idempotency_key,
                    "fromAccountId": params.from_account_id,
                    "toAccountId": params.to_account_id,
                    "amount": params.amount.get(),
                    "reason": err.to_string(),
                    "code": err.code(),
                }),
            )
            .await;
    }
}

/// Looks up a transfer plus its ledger pair and fraud signals, only if the
/// requesting user owns either account (spec.md §6 `getTransfer`).
pub async fn get_transfer(
    db: &Database,
    transfer_id: Uuid,
    requesting_user_id: Uuid,
) -> Result<Option<TransferResult>, KernelError> {
    let transfer = match TransferRepository::find_by_id(db.pool(), transfer_id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    let owns = account_belongs_to_user(db, transfer.from_account_id, requesting_user_id).await?
        || account_belongs_to_user(db, transfer.to_account_id, requesting_user_id).await?;
    if !owns {
        return Ok(None);
    }

    let ledger_entries = TransferRepository::ledger_entries_for(db.pool(), transfer_id).await?;
    let fraud_signals = TransferRepository::fraud_signals_for(db.pool(), transfer_id).await?;

    Ok(Some(TransferResult {
        transfer,
        ledger_entries,
        fraud_signals,
        replayed: false,
    }))
}

async fn account_belongs_to_user(
    db: &Database,
    account_id: Uuid,
    user_id: Uuid,
) -> Result<bool, KernelError> {
    let row = sqlx::query("SELECT 1 FROM accounts WHERE id = $1 AND user_id = $2")
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?;
    Ok(row.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_status_codes_match_spec() {
        assert_eq!(Outcome::Created.status_code(), 201);
        assert_eq!(Outcome::Replayed.status_code(), 200);
    }

    fn config() -> AppConfig {
        AppConfig {
            database_url: "postgres://x".into(),
            redis_url: "redis://x".into(),
            kafka_brokers: "x".into(),
            http_port: 8080,
            db_pool_size: 5,
            db_statement_timeout_ms: 8000,
            db_idle_in_tx_ms: 5000,
            min_transfer_minor: 100,
            max_transfer_minor: 1_000_000_00,
            fraud_approve_below: 30,
            fraud_review_below: 60,
            fraud_challenge_below: 80,
            fraud_request_timeout_ms: 5000,
            fraud_fail_open: true,
            lock_ttl_seconds: 10,
            idempotency_ttl_seconds: 86400,
            event_publish_await: false,
            region_utc_offset_minutes: 330,
            log_level: "info".into(),
            log_dir: "logs".into(),
            log_json: false,
        }
    }

    fn params(from: Uuid, to: Uuid, amount: i64, currency: &str) -> InitiateTransferParams {
        InitiateTransferParams {
            idempotency_key: "k".into(),
            from_account_id: from,
            to_account_id: to,
            amount: MinorUnits::from_i64(amount),
            currency: currency.to_string(),
            description: None,
            user_id: Uuid::new_v4(),
            trace_id: "trace".into(),
        }
    }

    #[test]
    fn rejects_self_transfer() {
        let cfg = config();
        let a = Uuid::new_v4();
        let err = validate_params(&cfg, &params(a, a, 1_000, "INR")).unwrap_err();
        assert!(matches!(err, KernelError::Validation(_)));
    }

    #[test]
    fn rejects_unsupported_currency() {
        let cfg = config();
        let err =
            validate_params(&cfg, &params(Uuid::new_v4(), Uuid::new_v4(), 1_000, "USD"))
                .unwrap_err();
        assert!(matches!(err, KernelError::Validation(_)));
    }

    #[test]
    fn amount_exactly_at_min_transfer_succeeds() {
        let cfg = config();
        let p = params(Uuid::new_v4(), Uuid::new_v4(), cfg.min_transfer_minor, "INR");
        assert!(validate_params(&cfg, &p).is_ok());
    }

    #[test]
    fn amount_one_below_min_transfer_fails() {
        let cfg = config();
        let p = params(
            Uuid::new_v4(),
            Uuid::new_v4(),
            cfg.min_transfer_minor - 1,
            "INR",
        );
        assert!(matches!(
            validate_params(&cfg, &p),
            Err(KernelError::Validation(_))
        ));
    }

    #[test]
    fn amount_exactly_at_max_transfer_succeeds() {
        let cfg = config();
        let p = params(Uuid::new_v4(), Uuid::new_v4(), cfg.max_transfer_minor, "INR");
        assert!(validate_params(&cfg, &p).is_ok());
    }

    #[test]
    fn amount_one_above_max_transfer_fails() {
        let cfg = config();
        let p = params(
            Uuid::new_v4(),
            Uuid::new_v4(),
            cfg.max_transfer_minor + 1,
            "INR",
        );
        assert!(matches!(
            validate_params(&cfg, &p),
            Err(KernelError::Validation(_))
        ));
    }
}
