//! High-voltage ramp and readback.

use std::thread;
use std::time::Duration;

use session::BootMode::Domapp;
use testkit::{TestCase, TestCtx, TestError, TestInfo, TestRecord};

use crate::util::log_moni;

/// Target supply in DAC counts (two counts per volt, so 800 V).
const NOMINAL_HV_COUNTS: u16 = 1600;
/// Allowed ADC readback deviation in counts (10 V).
const HV_TOLERANCE: u16 = 20;
/// Supply settle time after the ramp.
const HV_SETTLE: Duration = Duration::from_secs(2);

/// Ramps the PMT supply to a nominal target, checks the ADC readback,
/// and always restores voltage-off + disable, even on failure.
///
/// HV-capable and only-if-selected; runs without `--hv` are impossible
/// because the test never joins the pool.
#[derive(Default)]
pub struct HvRampTest {
    record: TestRecord,
}

impl HvRampTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for HvRampTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("hv-ramp", Domapp, Domapp).hv()
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let hv = ctx.hv;
        let mut da = ctx.domapp();

        let ramp = (|| -> Result<(u16, u16), TestError> {
            da.reset_moni_buffer()?;
            da.enable_hv(hv)?;
            da.set_hv(hv, NOMINAL_HV_COUNTS)?;
            thread::sleep(HV_SETTLE);
            Ok(da.query_hv()?)
        })();

        match ramp {
            Ok((adc, dac)) => {
                self.record
                    .note(format!("HV: read {} V (ADC) {} V (DAC)", adc / 2, dac / 2));
                if adc.abs_diff(NOMINAL_HV_COUNTS) > HV_TOLERANCE {
                    self.record.fail(format!(
                        "HV readback {adc} deviates from target {NOMINAL_HV_COUNTS} by more than {HV_TOLERANCE} counts"
                    ));
                } else {
                    self.record
                        .set_summary(format!("HV {} V within tolerance", adc / 2));
                    self.record.pass();
                }
            }
            Err(e) => {
                self.record.fail(e.to_string());
                log_moni(&mut da, &mut self.record);
            }
        }

        // Voltage off and supply disabled, no matter what happened above.
        // A zero target needs no grant.
        if let Err(e) = da.set_hv(None, 0) {
            self.record.fail(format!("HV OFF FAILED: {e}"));
        }
        if let Err(e) = da.disable_hv() {
            self.record.fail(format!("HV DISABLE FAILED: {e}"));
        }
        Ok(())
    }
}
