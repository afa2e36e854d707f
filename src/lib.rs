//! # Ecowitt Gateway Collector (ecogw)
//!
//! A telemetry collector for Ecowitt weather-station gateways
//! (GW1000/1100/1900/2000 family), speaking the vendor's TCP binary
//! protocol directly.
//!
//! ## Features
//!
//! - **Table-Driven Codec**: one immutable field registry drives decoding
//! - **Cycle Isolation**: a failed poll never takes down the process
//! - **Pluggable Collaborators**: configuration source and publish sink
//!   are traits, so the collector is testable without a device
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ecogw::prelude::*;
//!
//! let registry = FieldRegistry::live_data();
//! let codec = LiveDataCodec::new(&registry);
//!
//! let client = GatewayClient::new(GatewayClientConfig::default());
//! let frame = client.fetch_live_data("192.168.1.50:45000").await?;
//! let reading = codec.decode(&frame, chrono::Utc::now().timestamp())?;
//! ```
//!
//! ## Wire Protocol
//!
//! One request, one response per cycle:
//!
//! | Offset | Size | Meaning |
//! |--------|------|---------|
//! | 0–1    | 2    | Marker `FF FF` |
//! | 2      | 1    | Frame type `27` (live data) |
//! | 3–4    | 2    | Big-endian payload length = total length − 2 |
//! | 5..n−1 | var  | `(code: 1 byte, value: N bytes)` fields per registry |
//! | n      | 1    | Checksum = sum(bytes\[2..n\]) mod 256 |

pub mod client;
pub mod codec;
pub mod collector;
pub mod config;
pub mod core;
pub mod publish;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{GatewayClient, GatewayClientConfig, LiveDataClient};
    pub use crate::codec::live_data::{LiveDataCodec, CMD_LIVE_DATA};
    pub use crate::collector::{Collector, CycleError};
    pub use crate::config::{CollectorConfig, ConfigSource};
    pub use crate::core::error::{
        CollectorError, ConfigError, DecodeError, PublishError, Result, TransportError,
    };
    pub use crate::core::reading::{Reading, Value};
    pub use crate::core::registry::{FieldRegistry, FieldSpec};
    pub use crate::publish::{live_data_topic, Publisher, QoS};
}

// Re-export core types at crate root for convenience
pub use crate::core::error::{
    CollectorError, ConfigError, DecodeError, PublishError, Result, TransportError,
};
pub use crate::core::reading::{Reading, Value};
pub use crate::core::registry::{FieldRegistry, FieldSpec};

// Re-export the main moving parts
pub use crate::client::{GatewayClient, GatewayClientConfig, LiveDataClient};
pub use crate::codec::live_data::LiveDataCodec;
pub use crate::collector::Collector;
pub use crate::publish::{Publisher, QoS};
