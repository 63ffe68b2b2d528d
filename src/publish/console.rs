//! Logging sink with immediate confirmation. For demo runs and environments
//! without a broker.

use anyhow::Result;

use super::{Delivery, DeliveryStatus, EventSink};

pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn send(&mut self, key: &str, payload: &[u8]) -> Result<Delivery> {
        log::info!("event key={} payload={}", key, String::from_utf8_lossy(payload));
        Ok(Delivery::ready(DeliveryStatus::Delivered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn confirms_immediately() {
        let mut sink = ConsoleSink::new();
        let delivery = sink.send("frame-1", b"{}").unwrap();
        assert_eq!(
            delivery.wait(Duration::from_millis(10)),
            DeliveryStatus::Delivered
        );
    }
}
