//! Event Publisher and Event Consumer Framework (spec.md §4.7, §4.8).

mod consumer;
mod envelope;
mod publisher;

pub use consumer::{EventConsumer, EventHandler};
pub use envelope::{EventEnvelope, Topic};
pub use publisher::EventPublisher;
