//! The concrete test library.
//!
//! Declaration order in [`standard_pool`] is load-bearing: the scheduler
//! breaks ties in pool order, so this list encodes the intended boot
//! sequence (Iceboot → Configboot and back, echo mode, then the Domapp
//! block, then back to Iceboot).

mod boot;
mod datataking;
mod echo;
mod hv;
mod power;
mod runtime;
pub mod util;

pub use boot::{
    CheckConfigboot, CheckIceboot, ConfigbootToIceboot, DomappToIceboot, EchoToIceboot,
    IcebootToConfigboot, IcebootToDomapp, IcebootToEcho,
};
pub use datataking::{MoniTest, SnTest, WaveformTest};
pub use echo::EchoPacketTest;
pub use hv::HvRampTest;
pub use power::PowerCycleTest;
pub use runtime::{DomIdTest, EchoMessageTest, FlasherSerialTest, GetDomappRelease};

use testkit::{PoolConfig, TestCase};

/// Builds the full pool for one channel, honoring the opt-in axes.
///
/// Gated tests (HV, flasher, power-cycle) join the pool only when their
/// axis is enabled; only-if-selected filtering on top of that is the
/// scheduler's job.
pub fn standard_pool(config: &PoolConfig) -> Vec<Box<dyn TestCase>> {
    let mut pool: Vec<Box<dyn TestCase>> = vec![
        Box::new(IcebootToConfigboot::new()),
        Box::new(CheckConfigboot::new()),
        Box::new(ConfigbootToIceboot::new()),
        Box::new(CheckIceboot::new()),
    ];
    if config.allow_power_cycle {
        pool.push(Box::new(PowerCycleTest::new()));
    }
    pool.push(Box::new(IcebootToEcho::new()));
    pool.push(Box::new(EchoPacketTest::new()));
    pool.push(Box::new(EchoToIceboot::new()));
    pool.push(Box::new(IcebootToDomapp::new()));
    pool.push(Box::new(GetDomappRelease::new()));
    pool.push(Box::new(DomIdTest::new()));
    pool.push(Box::new(EchoMessageTest::new()));
    pool.push(Box::new(MoniTest::new()));
    pool.push(Box::new(SnTest::new()));
    pool.push(Box::new(WaveformTest::new()));
    if config.allow_flasher {
        pool.push(Box::new(FlasherSerialTest::new()));
    }
    if config.allow_hv {
        pool.push(Box::new(HvRampTest::new()));
    }
    pool.push(Box::new(DomappToIceboot::new()));
    pool
}
