//! Frame codec for the Ecowitt TCP protocol.
//!
//! Pure functions over byte buffers; all I/O lives in [`crate::client`].

pub mod live_data;
