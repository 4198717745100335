//! Request/response DTOs for the gateway's two public endpoints (spec.md §6).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fraud::FraudAction;
use crate::transfer::{LedgerEntryType, TransferResult, TransferStatus};

#[derive(Debug, Deserialize)]
pub struct InitiateTransferRequest {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    /// Rupee-decimal string, e.g. `"500.00"` — parsed via `money::parse`.
    pub amount: String,
    pub currency: String,
    pub description: Option<String>,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub entry_type: &'static str,
    pub amount: String,
    pub balance_before: String,
    pub balance_after: String,
}

#[derive(Debug, Serialize)]
pub struct FraudSignalResponse {
    pub rule_name: String,
    pub points: i32,
    pub context: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: Uuid,
    pub idempotency_key: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: String,
    pub currency: String,
    pub status: &'static str,
    pub fraud_score: i32,
    pub fraud_action: &'static str,
    pub replayed: bool,
    pub ledger_entries: Vec<LedgerEntryResponse>,
    pub fraud_signals: Vec<FraudSignalResponse>,
    pub trace_id: String,
}

impl From<TransferResult> for TransferResponse {
    fn from(result: TransferResult) -> Self {
        TransferResponse {
            id: result.transfer.id,
            idempotency_key: result.transfer.idempotency_key,
            from_account_id: result.transfer.from_account_id,
            to_account_id: result.transfer.to_account_id,
            amount: crate::money::format(result.transfer.amount),
            currency: result.transfer.currency,
            status: status_str(result.transfer.status),
            fraud_score: result.transfer.fraud_score,
            fraud_action: fraud_action_str(result.transfer.fraud_action),
            replayed: result.replayed,
            ledger_entries: result
                .ledger_entries
                .into_iter()
                .map(|e| LedgerEntryResponse {
                    id: e.id,
                    account_id: e.account_id,
                    entry_type: entry_type_str(e.entry_type),
                    amount: crate::money::format(e.amount),
                    balance_before: crate::money::format(e.balance_before),
                    balance_after: crate::money::format(e.balance_after),
                })
                .collect(),
            fraud_signals: result
                .fraud_signals
                .into_iter()
                .map(|s| FraudSignalResponse {
                    rule_name: s.rule_name,
                    points: s.points,
                    context: s.context,
                })
                .collect(),
            trace_id: result.transfer.trace_id,
        }
    }
}

fn status_str(status: TransferStatus) -> &'static str {
    status.as_str()
}

fn fraud_action_str(action: FraudAction) -> &'static str {
    action.as_str()
}

fn entry_type_str(entry_type: LedgerEntryType) -> &'static str {
    entry_type.as_str()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub postgres: bool,
    pub redis: bool,
}
