//! Transfer (Transaction), Ledger Entry, and Fraud Signal models (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fraud::FraudAction;
use crate::money::MinorUnits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Reversed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Processing => "processing",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
            TransferStatus::Reversed => "reversed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "processing" => Some(TransferStatus::Processing),
            "completed" => Some(TransferStatus::Completed),
            "failed" => Some(TransferStatus::Failed),
            "reversed" => Some(TransferStatus::Reversed),
            _ => None,
        }
    }

    /// Once a transfer reaches a terminal state its row is never mutated
    /// again (spec.md §3 invariant).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Reversed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub idempotency_key: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: TransferStatus,
    pub failure_reason: Option<String>,
    pub fraud_score: i32,
    pub fraud_action: FraudAction,
    pub description: Option<String>,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tagged enumeration, not an open string (REDESIGN FLAGS item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryType {
    Debit,
    Credit,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Debit => "debit",
            LedgerEntryType::Credit => "credit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "debit" => Some(LedgerEntryType::Debit),
            "credit" => Some(LedgerEntryType::Credit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub account_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub amount: MinorUnits,
    pub balance_before: MinorUnits,
    pub balance_after: MinorUnits,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudSignalRecord {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub rule_name: String,
    pub points: i32,
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// The full record returned to a caller: the transfer plus its ledger pair
/// and fraud signals (spec.md §6 `getTransfer`), and whether this response
/// is a fresh completion or an idempotent replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub ledger_entries: Vec<LedgerEntry>,
    pub fraud_signals: Vec<FraudSignalRecord>,
    pub replayed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::MinorUnits;
    use chrono::Utc;
    use uuid::Uuid;

    /// Guards the idempotency cache's round trip: it stores a whole
    /// `TransferResult` as JSON and deserializes it back on a hit, so every
    /// field in the tree must survive `Serialize` + `Deserialize`.
    #[test]
    fn transfer_result_round_trips_through_json() {
        let now = Utc::now();
        let transfer = Transfer {
            id: Uuid::new_v4(),
            idempotency_key: "k1".to_string(),
            from_account_id: Uuid::new_v4(),
            to_account_id: Uuid::new_v4(),
            amount: MinorUnits::from_i64(50_000),
            currency: "INR".to_string(),
            status: TransferStatus::Completed,
            failure_reason: None,
            fraud_score: 0,
            fraud_action: FraudAction::Approve,
            description: None,
            trace_id: "trace-1".to_string(),
            created_at: now,
            updated_at: now,
        };
        let result = TransferResult {
            ledger_entries: vec![LedgerEntry {
                id: Uuid::new_v4(),
                transfer_id: transfer.id,
                account_id: transfer.from_account_id,
                entry_type: LedgerEntryType::Debit,
                amount: MinorUnits::from_i64(50_000),
                balance_before: MinorUnits::from_i64(1_000_000),
                balance_after: MinorUnits::from_i64(950_000),
                created_at: now,
            }],
            fraud_signals: vec![],
            transfer,
            replayed: false,
        };

        let json = serde_json::to_string(&result).expect("serialize");
        let back: TransferResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.transfer.id, result.transfer.id);
        assert_eq!(back.transfer.amount, result.transfer.amount);
        assert_eq!(back.ledger_entries.len(), 1);
        assert_eq!(back.ledger_entries[0].balance_after.get(), 950_000);
    }
}
