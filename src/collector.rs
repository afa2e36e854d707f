//! Acquisition loop.
//!
//! Drives one fetch-decode-publish cycle at a time: resolve the gateway
//! address, perform the TCP round trip, decode the frame with the current
//! wall-clock time, serialize and publish. Cycles are strictly
//! sequential; after every cycle, success or failure, the loop sleeps the
//! fixed poll interval and goes again. No failure class terminates the
//! process.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::client::LiveDataClient;
use crate::codec::live_data::LiveDataCodec;
use crate::config::ConfigSource;
use crate::core::error::{ConfigError, DecodeError, PublishError, TransportError};
use crate::core::reading::Reading;
use crate::core::registry::FieldRegistry;
use crate::publish::{live_data_topic, Publisher, QoS};

/// Failure of one acquisition cycle, tagged by the step that failed.
///
/// The loop recovers from every variant the same way (log, sleep, next
/// cycle), but the tag keeps the recovery a visible `match` instead of a
/// catch-all, and gives logs a stable shape per failure class.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Gateway address could not be resolved from the config source.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// TCP round trip failed; no decode or publish was attempted.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// Response frame was rejected; nothing was published.
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    /// Reading was lost at the sink; the next cycle supersedes it.
    #[error("publish: {0}")]
    Publish(#[from] PublishError),
}

/// The acquisition loop.
///
/// Generic over its collaborators so tests can script the transport and
/// capture the publishes. Owns the field registry; nothing else carries
/// state across cycles.
pub struct Collector<C, P, S> {
    client: C,
    publisher: P,
    source: S,
    registry: FieldRegistry,
    poll_interval: Duration,
}

impl<C, P, S> Collector<C, P, S>
where
    C: LiveDataClient,
    P: Publisher,
    S: ConfigSource,
{
    /// Create a collector polling at the given fixed interval.
    pub fn new(client: C, publisher: P, source: S, poll_interval: Duration) -> Self {
        Self {
            client,
            publisher,
            source,
            registry: FieldRegistry::live_data(),
            poll_interval,
        }
    }

    /// The registry driving this collector's codec.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Run one fetch-decode-publish cycle.
    ///
    /// The gateway address is resolved fresh on every call; the config
    /// source may move it between cycles.
    pub async fn run_cycle(&self) -> Result<Reading, CycleError> {
        let address = self.source.gateway_address()?;
        let device_id = self.source.device_id()?;

        let frame = self.client.fetch_live_data(&address).await?;

        let codec = LiveDataCodec::new(&self.registry);
        let reading = codec.decode(&frame, Utc::now().timestamp())?;

        let payload = serde_json::to_vec(&reading).map_err(|e| {
            PublishError::Sink {
                topic: live_data_topic(&device_id),
                reason: format!("serialization failed: {e}"),
            }
        })?;
        let topic = live_data_topic(&device_id);
        self.publisher
            .publish(&topic, QoS::AtMostOnce, &payload)
            .await?;

        Ok(reading)
    }

    /// Run cycles forever, isolating every failure to its own cycle.
    ///
    /// Never completes; the process is expected to be terminated
    /// externally.
    pub async fn run(&self) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "starting acquisition loop"
        );

        loop {
            match self.run_cycle().await {
                Ok(reading) => {
                    info!(
                        timestamp = reading.timestamp(),
                        fields = reading.len(),
                        "published reading"
                    );
                }
                Err(CycleError::Config(e)) => warn!(error = %e, "cycle skipped: configuration"),
                Err(CycleError::Transport(e)) => warn!(error = %e, "cycle skipped: transport"),
                Err(CycleError::Decode(e)) => warn!(error = %e, "cycle skipped: bad frame"),
                Err(CycleError::Publish(e)) => warn!(error = %e, "reading lost at sink"),
            }

            sleep(self.poll_interval).await;
        }
    }
}

/// Retry an initialization step a bounded number of times with doubling
/// backoff, logging each failed attempt.
///
/// Startup dependencies are the one place retry belongs: the collector is
/// useless without them, but spinning forever hides a dead deployment, so
/// the budget is bounded and the last error is returned.
pub async fn init_with_retry<T, E, F>(
    what: &str,
    max_attempts: u32,
    initial_backoff: Duration,
    mut init: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 1;

    loop {
        match init() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!(
                    %what,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "initialization failed, retrying"
                );
                sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::codec::live_data::{checksum, FRAME_MARKER, FRAME_TYPE_LIVE_DATA};

    fn valid_frame(fields: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&FRAME_MARKER);
        frame.push(FRAME_TYPE_LIVE_DATA);
        frame.extend_from_slice(&((fields.len() + 4) as u16).to_be_bytes());
        frame.extend_from_slice(fields);
        frame.push(0);
        *frame.last_mut().unwrap() = checksum(&frame);
        frame
    }

    /// Client that plays back a script, one entry per cycle.
    struct ScriptedClient {
        script: Mutex<Vec<Result<Vec<u8>, TransportError>>>,
    }

    impl ScriptedClient {
        fn new(mut script: Vec<Result<Vec<u8>, TransportError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl LiveDataClient for ScriptedClient {
        async fn fetch_live_data(&self, _address: &str) -> Result<Vec<u8>, TransportError> {
            self.script.lock().unwrap().pop().expect("script exhausted")
        }
    }

    /// Publisher that records every delivered message.
    #[derive(Default)]
    struct RecordingPublisher {
        messages: Mutex<Vec<(String, QoS, Vec<u8>)>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(
            &self,
            topic: &str,
            qos: QoS,
            payload: &[u8],
        ) -> Result<(), PublishError> {
            self.messages
                .lock()
                .unwrap()
                .push((topic.to_string(), qos, payload.to_vec()));
            Ok(())
        }
    }

    /// Publisher that always refuses.
    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, topic: &str, _: QoS, _: &[u8]) -> Result<(), PublishError> {
            Err(PublishError::Sink {
                topic: topic.to_string(),
                reason: "sink offline".into(),
            })
        }
    }

    struct FixedSource;

    impl ConfigSource for FixedSource {
        fn gateway_address(&self) -> Result<String, ConfigError> {
            Ok("127.0.0.1:45000".into())
        }

        fn device_id(&self) -> Result<String, ConfigError> {
            Ok("test-station".into())
        }
    }

    fn timeout_error() -> TransportError {
        TransportError::ConnectTimeout {
            addr: "127.0.0.1:45000".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_successful_cycle_publishes_reading() {
        let client = ScriptedClient::new(vec![Ok(valid_frame(&[0x01, 0x00, 0xC8]))]);
        let publisher = RecordingPublisher::default();
        let collector = Collector::new(client, publisher, FixedSource, Duration::from_secs(60));

        let reading = collector.run_cycle().await.unwrap();
        assert_eq!(
            reading.get("Indoor Temperature"),
            Some(crate::core::reading::Value::Float(20.0))
        );

        let messages = collector.publisher.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let (topic, qos, payload) = &messages[0];
        assert_eq!(topic, "ecowitt/test-station/livedata");
        assert_eq!(*qos, QoS::AtMostOnce);

        let json: serde_json::Value = serde_json::from_slice(payload).unwrap();
        assert_eq!(json["Indoor Temperature"], 20.0);
        assert!(json["Timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_transport_failure_isolated_to_its_cycle() {
        let client = ScriptedClient::new(vec![
            Err(timeout_error()),
            Ok(valid_frame(&[0x06, 45])),
        ]);
        let publisher = RecordingPublisher::default();
        let collector = Collector::new(client, publisher, FixedSource, Duration::from_secs(60));

        let err = collector.run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::Transport(_)));
        assert!(collector.publisher.messages.lock().unwrap().is_empty());

        // The next cycle is unaffected by the previous failure.
        let reading = collector.run_cycle().await.unwrap();
        assert_eq!(reading.len(), 1);
        assert_eq!(collector.publisher.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_frame_is_decode_error_and_not_published() {
        let mut frame = valid_frame(&[0x01, 0x00, 0xC8]);
        let last = frame.len() - 1;
        frame[last] = 0x00;

        let client = ScriptedClient::new(vec![Ok(frame)]);
        let publisher = RecordingPublisher::default();
        let collector = Collector::new(client, publisher, FixedSource, Duration::from_secs(60));

        let err = collector.run_cycle().await.unwrap_err();
        assert!(matches!(
            err,
            CycleError::Decode(DecodeError::ChecksumMismatch { .. })
        ));
        assert!(collector.publisher.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_is_tagged() {
        let client = ScriptedClient::new(vec![Ok(valid_frame(&[]))]);
        let collector = Collector::new(
            client,
            FailingPublisher,
            FixedSource,
            Duration::from_secs(60),
        );

        let err = collector.run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::Publish(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_with_retry_eventually_succeeds() {
        let attempts = AtomicUsize::new(0);
        let result = init_with_retry("test dep", 5, Duration::from_millis(10), || {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("not yet")
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_with_retry_gives_up_after_budget() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), &str> =
            init_with_retry("test dep", 3, Duration::from_millis(10), || {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("still broken")
            })
            .await;

        assert_eq!(result, Err("still broken"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
