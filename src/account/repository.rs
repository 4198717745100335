//! Account repository: loads, row-level locking, and the optimistic/ held-row
//! balance mutations the orchestrator performs inside its DB transaction
//! (spec.md §4.6 step 7). Runtime `sqlx::query`/`query_as`, not the `query!`
//! macro, matching the rest of this crate's `db`/`kvstore` modules — no
//! compile-time DATABASE_URL dependency.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::KernelError;
use crate::money::MinorUnits;

use super::models::{Account, AccountStatus};

pub struct AccountRepository;

/// Parses a raw `sqlx::Error` on a bad status string rather than
/// `KernelError`, so callers that need to distinguish Postgres error codes
/// (e.g. lock-not-available on `FOR UPDATE NOWAIT`) see the original error
/// type all the way through.
fn row_to_account_raw(row: &sqlx::postgres::PgRow) -> Result<Account, sqlx::Error> {
    let status_raw: String = row.try_get("status")?;
    let status = AccountStatus::from_str(&status_raw).ok_or_else(|| {
        sqlx::Error::Decode(format!("bad account status: {status_raw}").into())
    })?;
    Ok(Account {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        balance: MinorUnits::from_i64(row.try_get("balance")?),
        currency: row.try_get("currency")?,
        status,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, KernelError> {
    row_to_account_raw(row).map_err(KernelError::from)
}

impl AccountRepository {
    /// Plain read, outside any transaction — used at pipeline step 4 for
    /// existence/age checks before locks or fraud scoring.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, KernelError> {
        let row = sqlx::query(
            "SELECT id, user_id, balance, currency, status, version, created_at, updated_at \
             FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        row.as_ref().map(row_to_account).transpose()
    }

    /// `SELECT ... FOR UPDATE NOWAIT` inside the enclosing transaction
    /// (spec.md §4.6 step 7.1). A second holder raises a lock-not-available
    /// error from Postgres (SQLSTATE 55P03); returns the raw `sqlx::Error`
    /// so the orchestrator can tell that case apart from any other failure
    /// and retry instead of failing the request outright.
    pub async fn lock_for_update<'a>(
        tx: &mut Transaction<'a, Postgres>,
        id: Uuid,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, user_id, balance, currency, status, version, created_at, updated_at \
             FROM accounts WHERE id = $1 FOR UPDATE NOWAIT",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        row.as_ref().map(row_to_account_raw).transpose()
    }

    /// True if `err` is Postgres's "could not obtain lock" (55P03) — the
    /// signal that a `FOR UPDATE NOWAIT` hit a row already held by another
    /// transaction, and the caller should retry rather than fail.
    pub fn is_lock_not_available(err: &sqlx::Error) -> bool {
        matches!(err.as_database_error().and_then(|e| e.code()), Some(code) if code == "55P03")
    }

    /// Debit conditioned on the observed `version` (optimistic concurrency).
    /// Zero rows affected means someone else mutated the row since it was
    /// read — the caller retries the whole transaction.
    pub async fn debit_if_version<'a>(
        tx: &mut Transaction<'a, Postgres>,
        id: Uuid,
        amount: MinorUnits,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, KernelError> {
        let result = sqlx::query(
            "UPDATE accounts SET balance = balance - $1, version = version + 1, updated_at = $2 \
             WHERE id = $3 AND version = $4",
        )
        .bind(amount.get())
        .bind(now)
        .bind(id)
        .bind(expected_version)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Credit is unconditional on version because the row is already held by
    /// this transaction's `FOR UPDATE` lock (spec.md §4.6 step 7.5) — no
    /// other writer can have raced it.
    pub async fn credit<'a>(
        tx: &mut Transaction<'a, Postgres>,
        id: Uuid,
        amount: MinorUnits,
        now: DateTime<Utc>,
    ) -> Result<(), KernelError> {
        sqlx::query(
            "UPDATE accounts SET balance = balance + $1, version = version + 1, updated_at = $2 \
             WHERE id = $3",
        )
        .bind(amount.get())
        .bind(now)
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn create(pool: &PgPool, account: &Account) -> Result<(), KernelError> {
        sqlx::query(
            "INSERT INTO accounts (id, user_id, balance, currency, status, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(account.balance.get())
        .bind(&account.currency)
        .bind(account.status.as_str())
        .bind(account.version)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_status_round_trips_through_str() {
        for s in ["active", "frozen", "closed"] {
            let status = AccountStatus::from_str(s).unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!(AccountStatus::from_str("bogus").is_none());
    }
}
