//! In-memory module emulator.
//!
//! [`MockHub`] plays both external collaborator roles at once: it is the
//! hub control surface (enumeration, power relays) and the channel
//! provider (device handles, control paths) for a set of emulated
//! modules. Each emulated module speaks the real prompts in Iceboot and
//! Configboot, echoes bytes in echo mode, and answers framed messages in
//! Domapp mode, with scripting hooks for fault injection.

mod dom;
mod hub;

pub use dom::{ascii_moni_record, MockResponse};
pub use hub::MockHub;
