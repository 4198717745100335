//! Transfer (Transaction), Ledger Entry, Fraud Signal models, the
//! double-entry `LedgerWriter`, and the `TransferOrchestrator` pipeline
//! (spec.md §3, §4.5, §4.6). Generalized from the teacher's
//! `internal_transfer` two-service FSM into a single-DB-transaction
//! pipeline — see DESIGN.md.

pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod repository;

pub use ledger::LedgerWriter;
pub use models::{
    FraudSignalRecord, LedgerEntry, LedgerEntryType, Transfer, TransferResult, TransferStatus,
};
pub use orchestrator::{InitiateTransferParams, Outcome, TransferOrchestrator, get_transfer};
pub use repository::TransferRepository;
