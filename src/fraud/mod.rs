//! Fraud Engine (spec.md §4.4).
//!
//! Runs six independent rules concurrently — wall time is the slowest rule,
//! not the sum — and aggregates their points into a score and an action.
//! Grounded on the teacher's concurrent-join idiom (`futures`/`tokio::join!`
//! used throughout `engine.rs`/`pipeline.rs`), generalized from matching-
//! engine event fan-out to fraud-rule fan-in.
//!
//! If the whole evaluation does not complete within the configured timeout,
//! the engine fails open: `{score: 0, action: approve, signals: []}`. Rule
//! authors treat a missing kv-store read as "did not fire", never as
//! "fired" — see `rules.rs`.

mod rules;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::kvstore::KvStore;
use crate::money::MinorUnits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudAction {
    Approve,
    Review,
    Challenge,
    Decline,
}

impl FraudAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudAction::Approve => "approve",
            FraudAction::Review => "review",
            FraudAction::Challenge => "challenge",
            FraudAction::Decline => "decline",
        }
    }

    /// Open Question 1 (spec.md §9, bound in SPEC_FULL.md §13): `review` is
    /// allow-and-flag, so only `Challenge`/`Decline` block the transfer.
    pub fn blocks_transfer(&self) -> bool {
        matches!(self, FraudAction::Challenge | FraudAction::Decline)
    }
}

/// One fired rule, ready to become a `fraud_signals` row.
#[derive(Debug, Clone, Serialize)]
pub struct FiredSignal {
    pub rule_name: &'static str,
    pub points: i32,
    pub context: serde_json::Value,
}

impl FiredSignal {
    fn new(rule_name: &'static str, points: i32, context: serde_json::Value) -> Self {
        FiredSignal {
            rule_name,
            points,
            context,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudResult {
    pub score: i32,
    pub action: FraudAction,
    pub signals: Vec<FiredSignal>,
}

/// Everything a rule needs to evaluate one transfer. Threaded explicitly
/// rather than read from ambient request state (REDESIGN FLAGS: trace ID
/// and friends are explicit parameters so the pipeline is testable without
/// a request context).
#[derive(Debug, Clone)]
pub struct FraudContext {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: MinorUnits,
    pub sender_created_at: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub region_utc_offset_minutes: i32,
}

fn score_to_action(config: &AppConfig, score: i32) -> FraudAction {
    if score < config.fraud_approve_below {
        FraudAction::Approve
    } else if score < config.fraud_review_below {
        FraudAction::Review
    } else if score < config.fraud_challenge_below {
        FraudAction::Challenge
    } else {
        FraudAction::Decline
    }
}

pub struct FraudEngine {
    kv: KvStore,
    config: Arc<AppConfig>,
}

impl FraudEngine {
    pub fn new(kv: KvStore, config: Arc<AppConfig>) -> Self {
        FraudEngine { kv, config }
    }

    fn score_to_action(&self, score: i32) -> FraudAction {
        score_to_action(&self.config, score)
    }

    /// Evaluate all six rules concurrently, bounded by
    /// `fraud_request_timeout_ms`. On timeout, fails open per spec.md §4.4
    /// only when `fraud_fail_open` is set (default true); otherwise the
    /// timeout surfaces as a dependency error and the caller rejects the
    /// transfer rather than approving on missing fraud state.
    pub async fn evaluate(&self, ctx: &FraudContext) -> Result<FraudResult, crate::error::KernelError> {
        let timeout = self.config.fraud_request_timeout();
        match tokio::time::timeout(timeout, self.evaluate_inner(ctx)).await {
            Ok(result) => Ok(result),
            Err(_elapsed) if self.config.fraud_fail_open => {
                tracing::warn!(
                    sender_id = %ctx.sender_id,
                    "fraud engine timed out, failing open"
                );
                Ok(self.fail_open())
            }
            Err(_elapsed) => {
                tracing::warn!(
                    sender_id = %ctx.sender_id,
                    "fraud engine timed out, fail-open disabled, rejecting"
                );
                Err(crate::error::KernelError::DependencyUnavailable(
                    "fraud engine timed out".into(),
                ))
            }
        }
    }

    fn fail_open(&self) -> FraudResult {
        FraudResult {
            score: 0,
            action: FraudAction::Approve,
            signals: Vec::new(),
        }
    }

    async fn evaluate_inner(&self, ctx: &FraudContext) -> FraudResult {
        let (velocity, amount_anomaly, recipient_risk) = tokio::join!(
            rules::velocity(&self.kv, ctx),
            rules::amount_anomaly(&self.kv, ctx),
            rules::recipient_risk(&self.kv, ctx),
        );
        let unusual_hour = rules::unusual_hour(ctx);
        let new_account = rules::new_account(ctx);
        let round_amount = rules::round_amount(ctx);

        // Recorded after scoring so this transfer's own amount never counts
        // toward its own anomaly check.
        rules::record_amount(&self.kv, ctx).await;

        let signals: Vec<FiredSignal> = [
            velocity,
            amount_anomaly,
            unusual_hour,
            new_account,
            round_amount,
            recipient_risk,
        ]
        .into_iter()
        .flatten()
        .collect();

        let raw_score: i32 = signals.iter().map(|s| s.points).sum();
        let score = raw_score.min(100);
        let action = self.score_to_action(score);

        FraudResult {
            score,
            action,
            signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
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
        })
    }

    #[test]
    fn score_boundaries_match_spec_table() {
        let cfg = config();
        assert_eq!(score_to_action(&cfg, 29), FraudAction::Approve);
        assert_eq!(score_to_action(&cfg, 30), FraudAction::Review);
        assert_eq!(score_to_action(&cfg, 59), FraudAction::Review);
        assert_eq!(score_to_action(&cfg, 60), FraudAction::Challenge);
        assert_eq!(score_to_action(&cfg, 79), FraudAction::Challenge);
        assert_eq!(score_to_action(&cfg, 80), FraudAction::Decline);
        assert_eq!(score_to_action(&cfg, 100), FraudAction::Decline);
    }

    #[test]
    fn review_allows_and_challenge_decline_block() {
        assert!(!FraudAction::Approve.blocks_transfer());
        assert!(!FraudAction::Review.blocks_transfer());
        assert!(FraudAction::Challenge.blocks_transfer());
        assert!(FraudAction::Decline.blocks_transfer());
    }
}
