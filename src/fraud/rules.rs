//! The six independent fraud rules (spec.md §4.4). Each rule is a plain
//! async function: `Ok(Some(signal))` if it fired, `Ok(None)` if it did not.
//! A rule function itself never propagates a kv-store error upward — missing
//! state is always treated as "did not fire", per spec.md's explicit
//! instruction to rule authors — so only the engine-level timeout wrapper in
//! `mod.rs` can trigger the documented fail-open.

use chrono::Timelike;

use crate::kvstore::KvStore;

use super::{FiredSignal, FraudContext};

const VELOCITY_POINTS: i32 = 25;
const VELOCITY_WINDOW_SECONDS: u64 = 60;
const VELOCITY_MAX_ATTEMPTS: i64 = 3;

const AMOUNT_ANOMALY_POINTS: i32 = 30;
const AMOUNT_ANOMALY_WINDOW: isize = 20;
const AMOUNT_ANOMALY_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;
const AMOUNT_ANOMALY_MULTIPLIER: i64 = 5;

const UNUSUAL_HOUR_POINTS: i32 = 10;
const UNUSUAL_HOUR_START: u32 = 1;
const UNUSUAL_HOUR_END: u32 = 5;

const NEW_ACCOUNT_POINTS: i32 = 15;
const NEW_ACCOUNT_DAYS: i64 = 7;

const ROUND_AMOUNT_POINTS: i32 = 5;
/// Suspiciously round rupee amounts, expressed in minor units.
const ROUND_AMOUNTS: &[i64] = &[
    10_000,
    50_000,
    100_000,
    500_000,
    1_000_000,
    5_000_000,
    10_000_000,
];

const RECIPIENT_RISK_POINTS: i32 = 20;
const RECIPIENT_RISK_WINDOW_SECONDS: u64 = 60 * 60;
const RECIPIENT_RISK_THRESHOLD: i64 = 10;

/// Sender makes more than 3 transfer attempts within a 60-second rolling
/// window. Increments a counter keyed on sender, refreshing the TTL.
pub async fn velocity(kv: &KvStore, ctx: &FraudContext) -> Option<FiredSignal> {
    let key = format!("fraud:velocity:{}", ctx.sender_id);
    let count = kv.incr_ex(&key, VELOCITY_WINDOW_SECONDS).await.ok()?;
    if count > VELOCITY_MAX_ATTEMPTS {
        Some(FiredSignal::new(
            "velocity",
            VELOCITY_POINTS,
            serde_json::json!({ "attempts_in_window": count }),
        ))
    } else {
        None
    }
}

/// Current amount exceeds 5x the mean of the sender's last (up to 20)
/// transfer amounts. The current amount is recorded into the window
/// afterward (in `record_amount`) so future evaluations see it too.
pub async fn amount_anomaly(kv: &KvStore, ctx: &FraudContext) -> Option<FiredSignal> {
    let key = format!("fraud:amounts:{}", ctx.sender_id);
    let history = kv.zrange(&key).await.ok()?;
    if history.is_empty() {
        return None;
    }
    let amounts: Vec<i64> = history
        .iter()
        .filter_map(|member| member.rsplit_once(':').and_then(|(_, amt)| amt.parse().ok()))
        .collect();
    if amounts.is_empty() {
        return None;
    }
    let mean = amounts.iter().sum::<i64>() / amounts.len() as i64;
    if mean > 0 && ctx.amount.get() > mean * AMOUNT_ANOMALY_MULTIPLIER {
        Some(FiredSignal::new(
            "amount_anomaly",
            AMOUNT_ANOMALY_POINTS,
            serde_json::json!({ "amount": ctx.amount.get(), "mean_of_history": mean }),
        ))
    } else {
        None
    }
}

/// Records the current transfer amount into the sender's rolling window,
/// trimmed to the most recent 20 entries. Runs after scoring regardless of
/// whether `amount_anomaly` fired, so the window always reflects reality.
pub async fn record_amount(kv: &KvStore, ctx: &FraudContext) {
    let key = format!("fraud:amounts:{}", ctx.sender_id);
    let member = format!("{}:{}", ctx.now.timestamp_millis(), ctx.amount.get());
    let _ = kv
        .zadd_trim_ex(
            &key,
            ctx.now.timestamp_millis() as f64,
            &member,
            AMOUNT_ANOMALY_WINDOW,
            AMOUNT_ANOMALY_TTL_SECONDS,
        )
        .await;
}

/// Local-time hour (region-configured, default +5:30) falls in 01:00-05:00
/// inclusive.
pub fn unusual_hour(ctx: &FraudContext) -> Option<FiredSignal> {
    let local = ctx.now + chrono::Duration::minutes(ctx.region_utc_offset_minutes as i64);
    let hour = local.time().hour();
    if (UNUSUAL_HOUR_START..=UNUSUAL_HOUR_END).contains(&hour) {
        Some(FiredSignal::new(
            "unusual_hour",
            UNUSUAL_HOUR_POINTS,
            serde_json::json!({ "local_hour": hour }),
        ))
    } else {
        None
    }
}

/// Sender account age is under 7 days.
pub fn new_account(ctx: &FraudContext) -> Option<FiredSignal> {
    let age = ctx.now.signed_duration_since(ctx.sender_created_at);
    if age < chrono::Duration::days(NEW_ACCOUNT_DAYS) {
        Some(FiredSignal::new(
            "new_account",
            NEW_ACCOUNT_POINTS,
            serde_json::json!({ "age_seconds": age.num_seconds() }),
        ))
    } else {
        None
    }
}

/// Amount matches one of a small literal set of suspiciously round values.
pub fn round_amount(ctx: &FraudContext) -> Option<FiredSignal> {
    if ROUND_AMOUNTS.contains(&ctx.amount.get()) {
        Some(FiredSignal::new(
            "round_amount",
            ROUND_AMOUNT_POINTS,
            serde_json::json!({ "amount": ctx.amount.get() }),
        ))
    } else {
        None
    }
}

/// Recipient has been credited by more than 10 distinct senders within the
/// last hour. Uses set cardinality (not a counter) so repeat senders don't
/// double-count — spec.md §9 Open Question 5 names the counter variant a bug.
pub async fn recipient_risk(kv: &KvStore, ctx: &FraudContext) -> Option<FiredSignal> {
    let key = format!("fraud:recipient:{}", ctx.recipient_id);
    let card = kv
        .sadd_card_ex(
            &key,
            &ctx.sender_id.to_string(),
            RECIPIENT_RISK_WINDOW_SECONDS,
        )
        .await
        .ok()?;
    if card > RECIPIENT_RISK_THRESHOLD {
        Some(FiredSignal::new(
            "recipient_risk",
            RECIPIENT_RISK_POINTS,
            serde_json::json!({ "distinct_senders_last_hour": card }),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::MinorUnits;
    use chrono::Utc;
    use uuid::Uuid;

    fn ctx(amount: i64, sender_created_days_ago: i64, hour_utc: u32) -> FraudContext {
        let now = Utc::now()
            .date_naive()
            .and_hms_opt(hour_utc, 0, 0)
            .unwrap()
            .and_utc();
        FraudContext {
            sender_id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            amount: MinorUnits::from_i64(amount),
            sender_created_at: now - chrono::Duration::days(sender_created_days_ago),
            now,
            region_utc_offset_minutes: 0,
        }
    }

    #[test]
    fn round_amount_fires_on_literal_set() {
        let c = ctx(50_000, 100, 12);
        assert!(round_amount(&c).is_some());
        let c2 = ctx(50_001, 100, 12);
        assert!(round_amount(&c2).is_none());
    }

    #[test]
    fn new_account_fires_under_seven_days() {
        let c = ctx(1000, 3, 12);
        assert!(new_account(&c).is_some());
        let c2 = ctx(1000, 10, 12);
        assert!(new_account(&c2).is_none());
    }

    #[test]
    fn unusual_hour_fires_in_window() {
        let c = ctx(1000, 100, 3);
        assert!(unusual_hour(&c).is_some());
        let c2 = ctx(1000, 100, 14);
        assert!(unusual_hour(&c2).is_none());
    }

    #[test]
    fn unusual_hour_boundary_inclusive() {
        assert!(unusual_hour(&ctx(1000, 100, 1)).is_some());
        assert!(unusual_hour(&ctx(1000, 100, 5)).is_some());
        assert!(unusual_hour(&ctx(1000, 100, 0)).is_none());
        assert!(unusual_hour(&ctx(1000, 100, 6)).is_none());
    }
}
