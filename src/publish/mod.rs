//! Reliable event delivery.
//!
//! `EventSink` is the transport boundary: `send` hands a payload to the
//! sink and returns a [`Delivery`], a single-shot confirmation the caller
//! waits on with a timeout. [`ReliablePublisher`] wraps a sink with bounded
//! retries and exponential backoff.
//!
//! Guarantee: at-least-once, best-effort idempotent. A confirmation timeout
//! is ambiguous - the broker may have received the message - and retrying
//! after it is accepted, never treated as certain duplication. When all
//! attempts are exhausted the failure is surfaced to the caller and the
//! event is lost by design; there is no durable outbox.

mod console;
mod mqtt;

pub use console::ConsoleSink;
pub use mqtt::{MqttSink, MqttSinkConfig};

use anyhow::{anyhow, Result};
use std::sync::mpsc;
use std::time::Duration;

use crate::event::DetectionEvent;

/// Outcome of one delivery attempt, as reported by the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
}

/// Resolver half of a pending delivery, held by the sink.
pub struct DeliverySender(mpsc::Sender<DeliveryStatus>);

impl DeliverySender {
    pub fn resolve(self, status: DeliveryStatus) {
        // The waiter may have timed out and dropped its receiver already.
        let _ = self.0.send(status);
    }
}

/// Single-shot delivery confirmation the publisher waits on.
pub struct Delivery {
    rx: mpsc::Receiver<DeliveryStatus>,
}

impl Delivery {
    /// A pending delivery plus its resolver. Sinks with asynchronous
    /// confirmations resolve the sender from their event loop.
    pub fn pending() -> (DeliverySender, Delivery) {
        let (tx, rx) = mpsc::channel();
        (DeliverySender(tx), Delivery { rx })
    }

    /// An already-resolved delivery, for synchronous sinks.
    pub fn ready(status: DeliveryStatus) -> Delivery {
        let (tx, delivery) = Delivery::pending();
        tx.resolve(status);
        delivery
    }

    /// Waits for the confirmation, bounded by `timeout`. Exceeding the
    /// timeout is a failure for retry purposes, not a crash.
    pub fn wait(self, timeout: Duration) -> DeliveryStatus {
        match self.rx.recv_timeout(timeout) {
            Ok(status) => status,
            Err(mpsc::RecvTimeoutError::Timeout) => DeliveryStatus::Failed(format!(
                "no delivery confirmation within {:.1}s",
                timeout.as_secs_f64()
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                DeliveryStatus::Failed("sink dropped the delivery confirmation".to_string())
            }
        }
    }
}

/// Event transport boundary.
///
/// `key` is the partitioning/routing key (the frame id). Sinks may be shared
/// across pipeline instances only if the concrete implementation is safe for
/// concurrent use; this crate does not assume it and gives each orchestrator
/// its own sink.
pub trait EventSink {
    fn name(&self) -> &'static str;

    /// Hand a payload to the transport. Returns the pending confirmation.
    fn send(&mut self, key: &str, payload: &[u8]) -> Result<Delivery>;

    /// Flush buffered messages on shutdown.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Retry/backoff/timeout policy for [`ReliablePublisher`].
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total send attempts, including the first. At least 1.
    pub attempts: u32,
    /// Backoff before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,
    /// Bounded wait for each attempt's delivery confirmation.
    pub delivery_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

/// Wraps an [`EventSink`] with bounded retries and delivery confirmation.
pub struct ReliablePublisher {
    sink: Box<dyn EventSink>,
    policy: RetryPolicy,
}

impl ReliablePublisher {
    pub fn new(sink: Box<dyn EventSink>, policy: RetryPolicy) -> Self {
        let policy = RetryPolicy {
            attempts: policy.attempts.max(1),
            ..policy
        };
        Self { sink, policy }
    }

    /// Publishes one event, retrying on any failure (send error, explicit
    /// delivery error, confirmation timeout) up to the configured attempts.
    ///
    /// After the final failed attempt the error is surfaced to the caller;
    /// the caller decides whether losing the event ends the pipeline.
    pub fn publish(&mut self, event: &DetectionEvent) -> Result<()> {
        let payload = serde_json::to_vec(&event.wire_payload())?;
        let key = event.publish_key();

        let mut last_error = String::new();
        for attempt in 1..=self.policy.attempts {
            let outcome = match self.sink.send(key, &payload) {
                Ok(delivery) => delivery.wait(self.policy.delivery_timeout),
                Err(e) => DeliveryStatus::Failed(e.to_string()),
            };

            match outcome {
                DeliveryStatus::Delivered => {
                    log::debug!(
                        "event {} delivered via {} on attempt {}",
                        event.event_id,
                        self.sink.name(),
                        attempt
                    );
                    return Ok(());
                }
                DeliveryStatus::Failed(reason) => {
                    last_error = reason;
                    if attempt < self.policy.attempts {
                        let backoff = self.backoff_delay(attempt);
                        log::warn!(
                            "publish attempt {}/{} failed for event {} ({}), retrying in {:.2}s",
                            attempt,
                            self.policy.attempts,
                            event.event_id,
                            last_error,
                            backoff.as_secs_f64()
                        );
                        std::thread::sleep(backoff);
                    }
                }
            }
        }

        log::error!(
            "publish exhausted: event_id={} frame_id={} camera_id={} sink={} attempts={} last_error={}",
            event.event_id,
            event.frame_id,
            event.camera_id,
            self.sink.name(),
            self.policy.attempts,
            last_error
        );
        Err(anyhow!(
            "publish failed after {} attempts: {}",
            self.policy.attempts,
            last_error
        ))
    }

    /// Flush the underlying sink (shutdown path).
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        // 0.2s, 0.4s, 0.8s ... for the default base delay.
        self.policy.base_delay * 2u32.saturating_pow(failed_attempt - 1)
    }
}
