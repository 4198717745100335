//! Event Envelope (spec.md §3): the outer JSON object every bus message is
//! wrapped in. Grounded on the teacher's enum-over-repr-i16 convention
//! (`internal_transfer::types::ServiceId`/`TransferType`) for `Topic`, and on
//! the general shape of a tagged wire message the teacher already uses for
//! its websocket push events, generalized to a durable partitioned bus.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SCHEMA_VERSION: i32 = 1;

/// Topic names (spec.md §6). A tagged enumeration, not an open string
/// (REDESIGN FLAGS item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    PaymentInitiated,
    PaymentCompleted,
    PaymentFailed,
    PaymentFraudBlocked,
    FraudCheckRequested,
    FraudCheckResult,
    WebhookDeliveryFailed,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::PaymentInitiated => "payment.initiated",
            Topic::PaymentCompleted => "payment.completed",
            Topic::PaymentFailed => "payment.failed",
            Topic::PaymentFraudBlocked => "payment.fraud_blocked",
            Topic::FraudCheckRequested => "fraud.check.requested",
            Topic::FraudCheckResult => "fraud.check.result",
            Topic::WebhookDeliveryFailed => "webhook.delivery.failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "payment.initiated" => Some(Topic::PaymentInitiated),
            "payment.completed" => Some(Topic::PaymentCompleted),
            "payment.failed" => Some(Topic::PaymentFailed),
            "payment.fraud_blocked" => Some(Topic::PaymentFraudBlocked),
            "fraud.check.requested" => Some(Topic::FraudCheckRequested),
            "fraud.check.result" => Some(Topic::FraudCheckResult),
            "webhook.delivery.failed" => Some(Topic::WebhookDeliveryFailed),
            _ => None,
        }
    }
}

/// Every bus message, regardless of topic, is this shape. Consumers
/// deduplicate on `event_id`; messages within one topic are keyed by
/// `trace_id` so all events belonging to one end-user request land on the
/// same partition and are delivered in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event_type: String,
    pub timestamp: String,
    pub version: i32,
    pub trace_id: String,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(topic: Topic, trace_id: &str, data: serde_json::Value) -> Self {
        EventEnvelope {
            event_id: Uuid::new_v4(),
            event_type: topic.as_str().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: SCHEMA_VERSION,
            trace_id: trace_id.to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_round_trip() {
        for topic in [
            Topic::PaymentInitiated,
            Topic::PaymentCompleted,
            Topic::PaymentFailed,
            Topic::PaymentFraudBlocked,
            Topic::FraudCheckRequested,
            Topic::FraudCheckResult,
            Topic::WebhookDeliveryFailed,
        ] {
            assert_eq!(Topic::from_str(topic.as_str()), Some(topic));
        }
    }

    #[test]
    fn envelope_serializes_with_camel_case_fields() {
        let env = EventEnvelope::new(Topic::PaymentCompleted, "trace-1", serde_json::json!({"a": 1}));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["eventType"], serde_json::json!("payment.completed"));
        assert_eq!(value["traceId"], serde_json::json!("trace-1"));
        assert!(value.get("eventId").is_some());
    }
}
