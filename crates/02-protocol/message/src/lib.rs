//! Framed request/response messaging with the module application runtime.
//!
//! Valid only while the module is in Domapp mode. The wire format is an
//! 8-byte header followed by a self-describing payload; the protocol is
//! synchronous with a single outstanding request. The typed [`DomApp`]
//! client covers every query, configuration write, and bulk buffer pull
//! the harness performs.

mod client;
mod codec;
mod error;
mod hv;
mod moni;
pub mod ops;
mod sn;

pub use client::{DomApp, EngFormat, LcConfig, PulserMode, REQUEST_TIMEOUT};
pub use codec::{MessageHeader, HEADER_LEN, STATUS_SUCCESS};
pub use error::MessageError;
pub use hv::HvToken;
pub use moni::{MoniKind, MoniRecord};
pub use sn::{sn_clock_continuous, SnRecord, SN_BIN_CLOCK_TICKS};
