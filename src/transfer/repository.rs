//! Transfer repository: the `transactions`/`ledger_entries`/`fraud_signals`
//! table access the orchestrator and the read-side `getTransfer` lookup need.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::KernelError;
use crate::fraud::{FiredSignal, FraudAction};
use crate::money::MinorUnits;

use super::models::{FraudSignalRecord, LedgerEntry, LedgerEntryType, Transfer, TransferStatus};

pub struct TransferRepository;

fn fraud_action_from_str(s: &str) -> FraudAction {
    match s {
        "review" => FraudAction::Review,
        "challenge" => FraudAction::Challenge,
        "decline" => FraudAction::Decline,
        _ => FraudAction::Approve,
    }
}

fn row_to_transfer(row: &sqlx::postgres::PgRow) -> Result<Transfer, KernelError> {
    let status_raw: String = row.try_get("status")?;
    let status = TransferStatus::from_str(&status_raw)
        .ok_or_else(|| KernelError::unexpected("unknown", anyhow::anyhow!("bad transfer status")))?;
    let fraud_action_raw: String = row.try_get("fraud_action")?;
    Ok(Transfer {
        id: row.try_get("id")?,
        idempotency_key: row.try_get("idempotency_key")?,
        from_account_id: row.try_get("from_account_id")?,
        to_account_id: row.try_get("to_account_id")?,
        amount: MinorUnits::from_i64(row.try_get("amount")?),
        currency: row.try_get("currency")?,
        status,
        failure_reason: row.try_get("failure_reason")?,
        fraud_score: row.try_get("fraud_score")?,
        fraud_action: fraud_action_from_str(&fraud_action_raw),
        description: row.try_get("description")?,
        trace_id: row.try_get("trace_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_ledger_entry(row: &sqlx::postgres::PgRow) -> Result<LedgerEntry, KernelError> {
    let entry_type_raw: String = row.try_get("entry_type")?;
    let entry_type = LedgerEntryType::from_str(&entry_type_raw)
        .ok_or_else(|| KernelError::unexpected("unknown", anyhow::anyhow!("bad entry type")))?;
    Ok(LedgerEntry {
        id: row.try_get("id")?,
        transfer_id: row.try_get("transfer_id")?,
        account_id: row.try_get("account_id")?,
        entry_type,
        amount: MinorUnits::from_i64(row.try_get("amount")?),
        balance_before: MinorUnits::from_i64(row.try_get("balance_before")?),
        balance_after: MinorUnits::from_i64(row.try_get("balance_after")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_fraud_signal(row: &sqlx::postgres::PgRow) -> Result<FraudSignalRecord, KernelError> {
    Ok(FraudSignalRecord {
        id: row.try_get("id")?,
        transfer_id: row.try_get("transfer_id")?,
        rule_name: row.try_get("rule_name")?,
        points: row.try_get("points")?,
        context: row.try_get("context")?,
        created_at: row.try_get("created_at")?,
    })
}

impl TransferRepository {
    /// Durable backstop for idempotency (§14): looked up before insert so a
    /// racing duplicate never produces two transaction rows for one key,
    /// even if the Redis cache evicted or was never populated.
    pub async fn find_by_idempotency_key(
        pool: &PgPool,
        idempotency_key: &str,
    ) -> Result<Option<Transfer>, KernelError> {
        let row = sqlx::query(
            "SELECT id, idempotency_key, from_account_id, to_account_id, amount, currency, \
             status, failure_reason, fraud_score, fraud_action, description, trace_id, \
             created_at, updated_at FROM transactions WHERE idempotency_key = $1",
        )
        .bind(idempotency_key)
        .fetch_optional(pool)
        .await?;
        row.as_ref().map(row_to_transfer).transpose()
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Transfer>, KernelError> {
        let row = sqlx::query(
            "SELECT id, idempotency_key, from_account_id, to_account_id, amount, currency, \
             status, failure_reason, fraud_score, fraud_action, description, trace_id, \
             created_at, updated_at FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        row.as_ref().map(row_to_transfer).transpose()
    }

    pub async fn ledger_entries_for(
        pool: &PgPool,
        transfer_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, KernelError> {
        let rows = sqlx::query(
            "SELECT id, transfer_id, account_id, entry_type, amount, balance_before, \
             balance_after, created_at FROM ledger_entries WHERE transfer_id = $1 \
             ORDER BY created_at ASC",
        )
        .bind(transfer_id)
        .fetch_all(pool)
        .await?;
        rows.iter().map(row_to_ledger_entry).collect()
    }

    pub async fn fraud_signals_for(
        pool: &PgPool,
        transfer_id: Uuid,
    ) -> Result<Vec<FraudSignalRecord>, KernelError> {
        let rows = sqlx::query(
            "SELECT id, transfer_id, rule_name, points, context, created_at \
             FROM fraud_signals WHERE transfer_id = $1 ORDER BY created_at ASC",
        )
        .bind(transfer_id)
        .fetch_all(pool)
        .await?;
        rows.iter().map(row_to_fraud_signal).collect()
    }

    /// True if `err` is Postgres's unique-violation (23505) — the
    /// `transactions.idempotency_key` constraint firing because a racing
    /// duplicate committed between this request's idempotency-cache probe
    /// and its own insert. The durable backstop spec.md §4.3 promises: the
    /// cache is advisory, this constraint is not.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err.as_database_error().and_then(|e| e.code()), Some(code) if code == "23505")
    }

    /// Insert the completed transaction row (spec.md §4.6 step 7.6), inside
    /// the enclosing transaction. Returns the raw `sqlx::Error` (rather than
    /// converting through `KernelError`) so the orchestrator can distinguish
    /// a unique-key race from any other failure and react without losing the
    /// error's database error code.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_completed<'a>(
        tx: &mut Transaction<'a, Postgres>,
        id: Uuid,
        idempotency_key: &str,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: MinorUnits,
        currency: &str,
        fraud_score: i32,
        fraud_action: FraudAction,
        description: Option<&str>,
        trace_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO transactions \
             (id, idempotency_key, from_account_id, to_account_id, amount, currency, status, \
              fraud_score, fraud_action, description, trace_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7, $8, $9, $10, $11, $11)",
        )
        .bind(id)
        .bind(idempotency_key)
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount.get())
        .bind(currency)
        .bind(fraud_score)
        .bind(fraud_action.as_str())
        .bind(description)
        .bind(trace_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Audit rows, one per fired rule (spec.md §4.6 step 7.8).
    pub async fn insert_fraud_signals<'a>(
        tx: &mut Transaction<'a, Postgres>,
        transfer_id: Uuid,
        signals: &[FiredSignal],
        now: DateTime<Utc>,
    ) -> Result<(), KernelError> {
        for signal in signals {
            sqlx::query(
                "INSERT INTO fraud_signals (id, transfer_id, rule_name, points, context, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(transfer_id)
            .bind(signal.rule_name)
            .bind(signal.points)
            .bind(&signal.context)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}
