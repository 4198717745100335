//! ledgerflow — payment orchestration kernel.
//!
//! Account-to-account money transfer: idempotency, distributed locking,
//! fraud scoring, an ACID balance mutation with optimistic concurrency, a
//! double-entry ledger, and post-commit event publication. See `spec.md`
//! and `SPEC_FULL.md` for the full specification; `DESIGN.md` for the
//! grounding ledger mapping this crate's modules back to their source.

pub mod account;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod fraud;
pub mod gateway;
pub mod idempotency;
pub mod kvstore;
pub mod lock;
pub mod logging;
pub mod money;
pub mod transfer;
