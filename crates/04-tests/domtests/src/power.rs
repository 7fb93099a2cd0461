//! Pairwise power-cycle of the shared wire relay.

use std::thread;
use std::time::Duration;

use log::info;
use session::BootMode::Iceboot;
use testkit::{PairRole, TestCase, TestCtx, TestError, TestInfo, TestRecord};

/// Dwell with the relay off.
const POWER_OFF_DWELL: Duration = Duration::from_secs(1);
/// Wait for the modules to boot after power returns.
const BOOT_WAIT: Duration = Duration::from_secs(3);

/// Power-cycles the wire pair and verifies both modules come back.
///
/// The two slots of one pair run this test rendezvous-linked: slot B
/// announces readiness and parks; slot A drives the relay once both are
/// parked, then releases the pair through the finish event. The finish
/// event fires even when slot A's side fails, so the partner can never be
/// stranded by an error — only by a genuinely hung partner, which is the
/// documented, unbounded case.
#[derive(Default)]
pub struct PowerCycleTest {
    record: TestRecord,
}

impl PowerCycleTest {
    pub fn new() -> Self {
        Self::default()
    }

    fn verify_back_in_iceboot(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        ctx.session.channel_mut().reopen()?;
        ctx.session.softboot()?;
        let check = ctx.session.is_in_iceboot()?;
        if !check.ok {
            self.record
                .fail("check for iceboot prompt failed after power cycle");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

impl TestCase for PowerCycleTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("power-cycle", Iceboot, Iceboot).power_cycle()
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let Some(pair) = ctx.pair.clone() else {
            self.record.fail("power-cycle test has no rendezvous link");
            return Ok(());
        };
        let addr = ctx.session.channel().addr();
        let (card, wire) = addr.pair_key();

        match pair.role {
            PairRole::SlotB => {
                pair.link.start.signal();
                pair.link.finish.wait();
                self.verify_back_in_iceboot(ctx)?;
            }
            PairRole::SlotA => {
                pair.link.start.wait();
                info!("{addr}: cycling power on card {card} pair {wire}");
                let cycled = (|| -> Result<(), TestError> {
                    ctx.hub.power_off(card, wire)?;
                    thread::sleep(POWER_OFF_DWELL);
                    ctx.hub.power_on(card, wire)?;
                    thread::sleep(BOOT_WAIT);
                    Ok(())
                })();
                let verified = match cycled {
                    Ok(()) => self.verify_back_in_iceboot(ctx),
                    Err(e) => {
                        self.record.fail(format!("power cycle failed: {e}"));
                        Ok(())
                    }
                };
                pair.link.finish.signal();
                verified?;
            }
        }
        Ok(())
    }
}
