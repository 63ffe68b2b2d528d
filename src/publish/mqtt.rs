//! MQTT event sink with broker-acknowledged delivery.
//!
//! Publishes at QoS 1; a delivery is confirmed when the broker's PUBACK
//! arrives. A background thread drains the connection event loop and
//! resolves pending confirmations in order, which is correct because the
//! publisher keeps at most one message in flight - it waits for each
//! confirmation (or its timeout) before sending again.

use anyhow::{anyhow, Context, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, Incoming, MqttOptions};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Delivery, DeliverySender, DeliveryStatus, EventSink};

#[derive(Clone, Debug)]
pub struct MqttSinkConfig {
    /// Broker address as `host:port` (IPv6 in brackets).
    pub broker_addr: String,
    /// Base topic; events are published to `{topic}/{key}`.
    pub topic: String,
    pub client_id: String,
}

impl Default for MqttSinkConfig {
    fn default() -> Self {
        Self {
            broker_addr: "127.0.0.1:1883".to_string(),
            topic: "anpr/plates".to_string(),
            client_id: "anprd".to_string(),
        }
    }
}

type PendingQueue = Arc<Mutex<VecDeque<DeliverySender>>>;

pub struct MqttSink {
    client: Client,
    topic: String,
    pending: PendingQueue,
    event_loop_handle: Option<std::thread::JoinHandle<()>>,
}

impl MqttSink {
    pub fn connect(config: MqttSinkConfig) -> Result<Self> {
        let (host, port) = split_host_port(&config.broker_addr)?;

        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(60));
        options.set_clean_start(true);

        let (client, connection) = Client::new(options, 10);
        let pending: PendingQueue = Arc::new(Mutex::new(VecDeque::new()));
        let handle = spawn_event_loop(connection, pending.clone());

        log::info!(
            "mqtt sink connected to {} (topic prefix {})",
            config.broker_addr,
            config.topic
        );

        Ok(Self {
            client,
            topic: config.topic,
            pending,
            event_loop_handle: Some(handle),
        })
    }
}

fn spawn_event_loop(mut connection: Connection, pending: PendingQueue) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Incoming::PubAck(_))) => {
                    let sender = pending.lock().ok().and_then(|mut q| q.pop_front());
                    if let Some(sender) = sender {
                        sender.resolve(DeliveryStatus::Delivered);
                    }
                }
                Ok(Event::Incoming(_)) | Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    log::warn!("mqtt connection error: {}", e);
                    // Every pending delivery is now unconfirmable.
                    if let Ok(mut queue) = pending.lock() {
                        while let Some(sender) = queue.pop_front() {
                            sender.resolve(DeliveryStatus::Failed(format!(
                                "mqtt connection error: {}",
                                e
                            )));
                        }
                    }
                    break;
                }
            }
        }
    })
}

impl EventSink for MqttSink {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    fn send(&mut self, key: &str, payload: &[u8]) -> Result<Delivery> {
        let topic = format!("{}/{}", self.topic, key);
        let (sender, delivery) = Delivery::pending();

        // Enqueue before publishing so a fast PUBACK cannot race the queue.
        self.pending
            .lock()
            .map_err(|_| anyhow!("mqtt pending queue poisoned"))?
            .push_back(sender);

        if let Err(e) = self
            .client
            .publish(&topic, QoS::AtLeastOnce, false, payload.to_vec())
        {
            if let Ok(mut queue) = self.pending.lock() {
                queue.pop_back();
            }
            return Err(anyhow!("mqtt publish to {} failed: {}", topic, e));
        }

        Ok(delivery)
    }

    fn flush(&mut self) -> Result<()> {
        // rumqttc flushes on disconnect; nothing buffered client-side here.
        Ok(())
    }
}

impl Drop for MqttSink {
    fn drop(&mut self) {
        if let Err(e) = self.client.disconnect() {
            log::warn!("mqtt disconnect failed: {}", e);
        }
        if let Some(handle) = self.event_loop_handle.take() {
            let _ = handle.join();
        }
    }
}

fn split_host_port(addr: &str) -> Result<(String, u16)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid broker address: {}", addr))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("missing broker port in {}", addr))?;
        let port: u16 = port.parse().context("invalid broker port")?;
        return Ok((host.to_string(), port));
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("missing broker port in {}", addr))?;
    let port: u16 = port.parse().context("invalid broker port")?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_host_and_port() {
        assert_eq!(
            split_host_port("127.0.0.1:1883").unwrap(),
            ("127.0.0.1".to_string(), 1883)
        );
        assert_eq!(
            split_host_port("broker.local:8883").unwrap(),
            ("broker.local".to_string(), 8883)
        );
    }

    #[test]
    fn splits_bracketed_ipv6() {
        assert_eq!(
            split_host_port("[::1]:1883").unwrap(),
            ("::1".to_string(), 1883)
        );
    }

    #[test]
    fn rejects_missing_port() {
        assert!(split_host_port("127.0.0.1").is_err());
        assert!(split_host_port("[::1]").is_err());
    }
}
