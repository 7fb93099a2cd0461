//! Byte-oriented channels to DOM mainboards and the hub control surface.
//!
//! One device handle exists per (card, pair, slot) address. Handles are
//! non-blocking at the driver level; this crate layers bounded-timeout
//! write/read loops on top and exposes the out-of-band control paths
//! (softboot, comm-reset) plus the hub proc tree (enumeration, power).

mod addr;
mod byte_channel;
mod dev;
mod error;
mod hub;
mod poll;

pub use addr::{DomAddr, DomSlot};
pub use byte_channel::{ByteChannel, ChannelProvider, RawDevice, BLOCK_SIZE};
pub use dev::{DevProvider, ProcHub};
pub use error::ChannelError;
pub use hub::{CardInfo, HubControl, PairInfo};
pub use poll::PollTimer;
