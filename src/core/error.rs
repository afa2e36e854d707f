//! Error types for the Ecowitt collector.
//!
//! Each failure class gets its own enum so the acquisition loop can match
//! on the step that failed instead of catching everything in one bucket:
//!
//! - [`TransportError`] - the TCP round trip to the gateway failed
//! - [`DecodeError`] - the response buffer is not a valid live-data frame
//! - [`PublishError`] - the downstream sink rejected the reading
//! - [`ConfigError`] - configuration could not be loaded or is incomplete
//!
//! [`CollectorError`] is the umbrella used at API boundaries (CLI,
//! initialization) where the caller does not care which class it was.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Convenient result alias for collector operations.
pub type Result<T, E = CollectorError> = std::result::Result<T, E>;

/// Failure of one TCP round trip to the gateway.
///
/// Classification only; no retry policy lives here. DNS failures surface
/// through [`TransportError::Connect`], since resolution happens inside
/// the connect call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection attempt did not complete within the timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Connection attempt failed (refused, unreachable, DNS failure).
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Response did not arrive within the read timeout.
    #[error("read from {addr} timed out after {timeout:?}")]
    ReadTimeout { addr: String, timeout: Duration },

    /// I/O failure after the connection was established (reset, broken pipe).
    #[error("i/o with {addr} failed: {source}")]
    Io {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Structural rejection of a response buffer.
///
/// Variants are ordered the way validation runs: a buffer failing an
/// earlier check is never reported with a later variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer is too short to hold header, length and checksum.
    #[error("frame truncated: {len} bytes, need at least 6")]
    TruncatedFrame { len: usize },

    /// Marker or frame-type bytes do not match the live-data response.
    #[error("invalid header: got {marker:02X?} type {frame_type:#04x}")]
    InvalidHeader { marker: [u8; 2], frame_type: u8 },

    /// Declared payload length disagrees with the buffer length.
    #[error("length mismatch: declared {declared}, buffer implies {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Checksum byte does not match the sum of the covered bytes.
    #[error("checksum mismatch: computed {computed:#04x}, frame says {stated:#04x}")]
    ChecksumMismatch { computed: u8, stated: u8 },
}

/// Failure to hand a reading to the downstream sink.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The sink rejected the message or is unreachable.
    #[error("sink rejected message on {topic}: {reason}")]
    Sink { topic: String, reason: String },

    /// Writing to the sink transport failed.
    #[error("publish i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::config::CollectorConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required setting is absent or empty.
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Umbrella error for API boundaries.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ChecksumMismatch {
            computed: 0xF7,
            stated: 0x00,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: computed 0xf7, frame says 0x00"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: CollectorError = DecodeError::TruncatedFrame { len: 3 }.into();
        assert!(matches!(err, CollectorError::Decode(_)));

        let err: CollectorError = ConfigError::Missing("gateway_address").into();
        assert_eq!(
            err.to_string(),
            "missing required setting: gateway_address"
        );
    }
}
