//! Publish sink abstraction.
//!
//! The collector hands each serialized reading to a [`Publisher`]. The
//! trait is deliberately narrow (topic, QoS, payload) so MQTT brokers,
//! platform IPC clients and test fakes all fit behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::core::error::PublishError;

/// Delivery guarantee requested from the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QoS {
    /// Fire and forget; a lost reading is superseded by the next cycle.
    #[default]
    AtMostOnce,

    /// Delivery confirmed by the sink.
    AtLeastOnce,
}

/// Build the live-data topic for a device identifier.
///
/// ```
/// assert_eq!(ecogw::publish::live_data_topic("roof"), "ecowitt/roof/livedata");
/// ```
pub fn live_data_topic(device_id: &str) -> String {
    format!("ecowitt/{device_id}/livedata")
}

/// Trait for telemetry sinks.
///
/// Uses `async_trait` so the collector can hold a `dyn Publisher` when
/// the sink is chosen at runtime.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver one payload to the given topic.
    async fn publish(&self, topic: &str, qos: QoS, payload: &[u8]) -> Result<(), PublishError>;
}

/// Publisher that writes one JSON line per message to stdout.
///
/// The default sink for the CLI binary; downstream tooling picks the
/// lines up from the process output. Real telemetry backends implement
/// [`Publisher`] against their own client.
pub struct JsonLinesPublisher {
    out: Mutex<Stdout>,
}

impl JsonLinesPublisher {
    /// Create a stdout-backed publisher.
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for JsonLinesPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    topic: &'a str,
    qos: QoS,
    payload: &'a serde_json::value::RawValue,
}

#[async_trait]
impl Publisher for JsonLinesPublisher {
    async fn publish(&self, topic: &str, qos: QoS, payload: &[u8]) -> Result<(), PublishError> {
        let payload_str = std::str::from_utf8(payload).map_err(|e| PublishError::Sink {
            topic: topic.to_string(),
            reason: format!("payload is not UTF-8 JSON: {e}"),
        })?;
        let raw = serde_json::value::RawValue::from_string(payload_str.to_string()).map_err(
            |e| PublishError::Sink {
                topic: topic.to_string(),
                reason: format!("payload is not valid JSON: {e}"),
            },
        )?;

        let line = JsonLine {
            topic,
            qos,
            payload: &raw,
        };
        let mut encoded = serde_json::to_vec(&line).map_err(|e| PublishError::Sink {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;
        encoded.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&encoded).await?;
        out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_data_topic() {
        assert_eq!(live_data_topic("station-1"), "ecowitt/station-1/livedata");
    }

    #[test]
    fn test_qos_serde() {
        assert_eq!(serde_json::to_string(&QoS::AtMostOnce).unwrap(), r#""at_most_once""#);
        let qos: QoS = serde_json::from_str(r#""at_least_once""#).unwrap();
        assert_eq!(qos, QoS::AtLeastOnce);
    }

    #[tokio::test]
    async fn test_jsonl_rejects_non_json_payload() {
        let publisher = JsonLinesPublisher::new();
        let err = publisher
            .publish("ecowitt/x/livedata", QoS::AtMostOnce, b"not json")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Sink { .. }));
    }

    #[tokio::test]
    async fn test_jsonl_accepts_reading_payload() {
        let publisher = JsonLinesPublisher::new();
        publisher
            .publish("ecowitt/x/livedata", QoS::AtMostOnce, br#"{"Timestamp":1}"#)
            .await
            .unwrap();
    }
}
