//! Live-data frame codec.
//!
//! Encodes the fixed "read live data" command and decodes the response
//! frame into a [`Reading`], driven by the [`FieldRegistry`].
//!
//! Decoding is a pure function of the buffer, the injected timestamp and
//! the registry: no I/O, no clock access, no state. That keeps the whole
//! protocol surface testable with literal byte arrays.

use tracing::debug;

use crate::core::error::DecodeError;
use crate::core::reading::{Reading, Value};
use crate::core::registry::FieldRegistry;

/// The encoded "read live data" request, sent verbatim every cycle.
pub const CMD_LIVE_DATA: [u8; 5] = [0xFF, 0xFF, 0x27, 0x03, 0x2A];

/// Two-byte frame marker opening every request and response.
pub const FRAME_MARKER: [u8; 2] = [0xFF, 0xFF];

/// Frame type byte of the live-data response.
pub const FRAME_TYPE_LIVE_DATA: u8 = 0x27;

/// Shortest structurally valid frame: marker, type, length, checksum.
const MIN_FRAME_LEN: usize = 6;

/// Offset of the first `(code, value)` field in a response frame.
const FIELDS_OFFSET: usize = 5;

/// Checksum over bytes `[2, n)`: everything after the marker, excluding
/// the checksum byte itself, truncated to the low 8 bits.
pub fn checksum(frame: &[u8]) -> u8 {
    frame[2..frame.len() - 1]
        .iter()
        .fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Decoder for live-data response frames.
///
/// Borrows the registry rather than owning it so one table can drive any
/// number of decoders and stays inspectable from the outside.
#[derive(Debug, Clone, Copy)]
pub struct LiveDataCodec<'a> {
    registry: &'a FieldRegistry,
}

impl<'a> LiveDataCodec<'a> {
    /// Create a codec over the given field registry.
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self { registry }
    }

    /// The command bytes requesting one live-data frame.
    pub fn command(&self) -> &'static [u8] {
        &CMD_LIVE_DATA
    }

    /// Decode a response buffer into a reading stamped with `now`
    /// (epoch seconds, injected by the caller).
    ///
    /// Validation order: truncation, header, declared length, checksum.
    /// Field iteration then walks `(code, value)` pairs from offset 5 up
    /// to the checksum byte. An unknown field code ends iteration and
    /// drops everything after it; that is how the gateway protocol has
    /// always been consumed, so a reading with only a timestamp is a
    /// valid (if uninformative) result, not an error.
    pub fn decode(&self, frame: &[u8], now: i64) -> Result<Reading, DecodeError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(DecodeError::TruncatedFrame { len: frame.len() });
        }

        if frame[0..2] != FRAME_MARKER || frame[2] != FRAME_TYPE_LIVE_DATA {
            return Err(DecodeError::InvalidHeader {
                marker: [frame[0], frame[1]],
                frame_type: frame[2],
            });
        }

        let declared = u16::from_be_bytes([frame[3], frame[4]]) as usize;
        let actual = frame.len() - 2;
        if declared != actual {
            return Err(DecodeError::LengthMismatch { declared, actual });
        }

        let computed = checksum(frame);
        let stated = frame[frame.len() - 1];
        if computed != stated {
            return Err(DecodeError::ChecksumMismatch { computed, stated });
        }

        let mut reading = Reading::new(now);
        let mut offset = FIELDS_OFFSET;
        let fields_end = frame.len() - 1;

        while offset < fields_end {
            let code = frame[offset];
            let Some(spec) = self.registry.get(code) else {
                // Legacy semantics: one unrecognized code discards the
                // remainder of the frame. Flagged so an operator can see
                // why fields from a new sensor never show up.
                debug!(code, offset, "unknown field code, dropping rest of frame");
                break;
            };

            let value_end = offset + 1 + spec.length;
            if value_end > fields_end {
                debug!(
                    code,
                    offset,
                    need = spec.length,
                    "field value runs past frame end, dropping rest of frame"
                );
                break;
            }

            let raw = read_be_uint(&frame[offset + 1..value_end]);
            let value = if spec.divisor == 1 {
                Value::Integer(raw as i64)
            } else {
                Value::Float(raw as f64 / spec.divisor as f64)
            };
            reading.push(spec.name, value);

            offset = value_end;
        }

        Ok(reading)
    }
}

/// Read up to 8 bytes as a big-endian unsigned integer.
fn read_be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}
