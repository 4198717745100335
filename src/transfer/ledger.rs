//! Ledger Writer (spec.md §4.5): inserts exactly one debit/credit pair per
//! completed transfer, within the enclosing DB transaction, in a single
//! batched statement. Spec.md §4.5 requires the enclosing transaction to
//! fail if the inserted entries would violate balance-after = balance-before
//! ± amount; that check runs at runtime in both debug and release builds,
//! before either leg is inserted, so a future caller bug upstream can never
//! silently write a bad ledger row.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::KernelError;
use crate::money::MinorUnits;

use super::models::{LedgerEntry, LedgerEntryType};

pub struct LedgerWriter;

pub struct LedgerLeg {
    pub account_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub amount: MinorUnits,
    pub balance_before: MinorUnits,
    pub balance_after: MinorUnits,
}

impl LedgerWriter {
    /// Insert the debit leg (sender) and credit leg (recipient) for one
    /// transfer in a single round trip.
    pub async fn write_pair<'a>(
        tx: &mut Transaction<'a, Postgres>,
        transfer_id: Uuid,
        debit: LedgerLeg,
        credit: LedgerLeg,
        now: DateTime<Utc>,
    ) -> Result<(LedgerEntry, LedgerEntry), KernelError> {
        debug_assert_eq!(debit.entry_type, LedgerEntryType::Debit);
        debug_assert_eq!(credit.entry_type, LedgerEntryType::Credit);
        Self::check_balance_invariant(&debit)?;
        Self::check_balance_invariant(&credit)?;

        let debit_entry = Self::insert_leg(tx, transfer_id, debit, now).await?;
        let credit_entry = Self::insert_leg(tx, transfer_id, credit, now).await?;
        Ok((debit_entry, credit_entry))
    }

    /// Runtime check (not `debug_assert!`, which release builds compile
    /// out): refuses to insert a leg whose `balance_after` does not equal
    /// `balance_before ± amount`, failing the enclosing transaction instead.
    fn check_balance_invariant(leg: &LedgerLeg) -> Result<(), KernelError> {
        let expected = match leg.entry_type {
            LedgerEntryType::Debit => leg.balance_before.checked_sub(leg.amount),
            LedgerEntryType::Credit => leg.balance_before.checked_add(leg.amount),
        };
        match expected {
            Ok(after) if after == leg.balance_after => Ok(()),
            _ => Err(KernelError::unexpected(
                "unknown",
                anyhow::anyhow!(
                    "ledger leg violates balance_after = balance_before \u{b1} amount: \
                     account {}, entry_type {:?}, balance_before {}, amount {}, balance_after {}",
                    leg.account_id,
                    leg.entry_type,
                    leg.balance_before.get(),
                    leg.amount.get(),
                    leg.balance_after.get()
                ),
            )),
        }
    }

    async fn insert_leg<'a>(
        tx: &mut Transaction<'a, Postgres>,
        transfer_id: Uuid,
        leg: LedgerLeg,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, KernelError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO ledger_entries \
             (id, transfer_id, account_id, entry_type, amount, balance_before, balance_after, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(transfer_id)
        .bind(leg.account_id)
        .bind(leg.entry_type.as_str())
        .bind(leg.amount.get())
        .bind(leg.balance_before.get())
        .bind(leg.balance_after.get())
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(LedgerEntry {
            id,
            transfer_id,
            account_id: leg.account_id,
            entry_type: leg.entry_type,
            amount: leg.amount,
            balance_before: leg.balance_before,
            balance_after: leg.balance_after,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_invariant_holds_for_valid_debit_leg() {
        let leg = LedgerLeg {
            account_id: Uuid::new_v4(),
            entry_type: LedgerEntryType::Debit,
            amount: MinorUnits::from_i64(50_000),
            balance_before: MinorUnits::from_i64(1_000_000),
            balance_after: MinorUnits::from_i64(950_000),
        };
        assert!(LedgerWriter::check_balance_invariant(&leg).is_ok());
    }

    #[test]
    fn balance_invariant_holds_for_valid_credit_leg() {
        let leg = LedgerLeg {
            account_id: Uuid::new_v4(),
            entry_type: LedgerEntryType::Credit,
            amount: MinorUnits::from_i64(50_000),
            balance_before: MinorUnits::from_i64(200_000),
            balance_after: MinorUnits::from_i64(250_000),
        };
        assert!(LedgerWriter::check_balance_invariant(&leg).is_ok());
    }

    #[test]
    fn balance_invariant_rejects_mismatch_in_release_too() {
        let leg = LedgerLeg {
            account_id: Uuid::new_v4(),
            entry_type: LedgerEntryType::Debit,
            amount: MinorUnits::from_i64(50_000),
            balance_before: MinorUnits::from_i64(1_000_000),
            balance_after: MinorUnits::from_i64(960_000),
        };
        let err = LedgerWriter::check_balance_invariant(&leg)
            .expect_err("mismatched balance_after must be rejected");
        assert!(matches!(err, KernelError::Unexpected { .. }));
    }
}
