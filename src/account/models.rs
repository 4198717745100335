//! Account data model (spec.md §3).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::money::MinorUnits;

/// An account's lifecycle state. Only `Active` accounts may be sender or
/// recipient of a new transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Frozen,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Frozen => "frozen",
            AccountStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AccountStatus::Active),
            "frozen" => Some(AccountStatus::Frozen),
            "closed" => Some(AccountStatus::Closed),
            _ => None,
        }
    }
}

/// Account (spec.md §3). `version` is the optimistic-concurrency token: it
/// strictly increases on every balance mutation, and the orchestrator
/// conditions its debit update on the value observed here.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: MinorUnits,
    pub currency: String,
    pub status: AccountStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        matches!(self.status, AccountStatus::Active)
    }

    /// Account age used by the fraud engine's new-account rule (§4.4).
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }
}
