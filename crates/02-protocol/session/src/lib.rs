//! Send-and-expect protocol sessions and the boot-mode state machine.
//!
//! A [`Session`] owns one [`ByteChannel`] and exchanges prompt-terminated
//! text with the module outside of its application runtime. The module has
//! four mutually exclusive boot modes; transitions between them are fixed
//! command/prompt pairs, and everything here is half-duplex and strictly
//! sequential per channel.

mod error;
mod mode;
mod proto;

pub use error::SessionError;
pub use mode::BootMode;
pub use proto::{Outcome, Session, DOMAPP_SETTLE};
