//! Event Publisher (spec.md §4.7).
//!
//! Wraps a payload in an envelope, serializes as JSON, and publishes keyed
//! by trace ID so all events belonging to one user action land on the same
//! partition and are strictly ordered. Connects lazily: `rdkafka`'s
//! `FutureProducer` dials the broker on first send, so a handshake failure
//! on first publish after startup surfaces (and is logged) right there and
//! is simply retried on the next publish — no separate reconnect logic
//! needed.

use std::time::Duration;

use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};

use super::envelope::{EventEnvelope, Topic};

#[derive(Clone)]
pub struct EventPublisher {
    producer: FutureProducer,
}

impl EventPublisher {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "10000")
            .create()?;
        Ok(EventPublisher { producer })
    }

    /// Publish one event. If `await_ack` is false (the default,
    /// `eventPublishAwait=false`), the send is spawned onto the runtime and
    /// this call returns immediately — step 10's fire-and-forget semantics:
    /// the pipeline does not block the HTTP response on broker
    /// acknowledgement, because the money has already moved and a failed
    /// publish is recovered by a separate outbox/retry mechanism (out of
    /// core scope). A failure is logged either way, never propagated.
    pub async fn publish(
        &self,
        topic: Topic,
        trace_id: &str,
        data: serde_json::Value,
        await_ack: bool,
    ) {
        if await_ack {
            self.send(topic, trace_id, data).await;
        } else {
            let publisher = self.clone();
            let trace_id = trace_id.to_string();
            tokio::spawn(async move {
                publisher.send(topic, &trace_id, data).await;
            });
        }
    }

    /// Always fire-and-forget, used for the blocking decision-path events
    /// (`payment.fraud_blocked`, `payment.failed`) where the orchestrator
    /// is already about to return an error and must not wait on the broker.
    pub async fn publish_best_effort(&self, topic: Topic, trace_id: &str, data: serde_json::Value) {
        self.publish(topic, trace_id, data, false).await;
    }

    async fn send(&self, topic: Topic, trace_id: &str, data: serde_json::Value) {
        let envelope = EventEnvelope::new(topic, trace_id, data);
        let payload = match serde_json::to_string(&envelope) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize event envelope");
                return;
            }
        };

        let record = FutureRecord::to(topic.as_str())
            .key(trace_id)
            .payload(&payload);

        if let Err((err, _msg)) = self.producer.send(record, Duration::from_secs(5)).await {
            tracing::error!(
                topic = topic.as_str(),
                trace_id = trace_id,
                error = %err,
                "event publish failed"
            );
        }
    }
}
