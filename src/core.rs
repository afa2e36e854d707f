//! Core types for the Ecowitt collector.
//!
//! This module provides the error taxonomy, the live-data field registry,
//! and the decoded reading type that the codec and collector build on.

pub mod error;
pub mod reading;
pub mod registry;

pub use error::{CollectorError, ConfigError, DecodeError, PublishError, Result, TransportError};
pub use reading::{Reading, Value};
pub use registry::{FieldRegistry, FieldSpec};
