//! Shared helpers for Domapp-mode tests.

use message::{ops::dac, DomApp, MessageError, MoniKind};
use testkit::TestRecord;

/// Standard DAC settings applied before any data-taking run.
pub const DEFAULT_DACS: [(u8, u16); 12] = [
    (dac::ATWD0_TRIGGER_BIAS, 850),
    (dac::ATWD1_TRIGGER_BIAS, 850),
    (dac::ATWD0_RAMP_RATE, 350),
    (dac::ATWD1_RAMP_RATE, 350),
    (dac::ATWD0_RAMP_TOP, 2300),
    (dac::ATWD1_RAMP_TOP, 2300),
    (dac::ATWD_ANALOG_REF, 2250),
    (dac::PMT_FE_PEDESTAL, 2130),
    (dac::SINGLE_SPE_THRESH, 560),
    (dac::MULTIPLE_SPE_THRESH, 650),
    (dac::FADC_REF, 800),
    (dac::INTERNAL_PULSER_AMP, 80),
];

/// Programs the standard DACs one by one.
pub fn set_default_dacs(da: &mut DomApp<'_>) -> Result<(), MessageError> {
    for (channel, value) in DEFAULT_DACS {
        da.write_dac(channel, value)?;
    }
    Ok(())
}

/// Drains buffered monitoring records into the diagnostic log.
///
/// ASCII and state-change summaries go in as text; a pull failure is
/// itself logged rather than propagated, since this runs on failure
/// paths where the primary cause is already recorded.
pub fn log_moni(da: &mut DomApp<'_>, record: &mut TestRecord) {
    match da.drain_moni() {
        Ok(records) => {
            for rec in records {
                match rec.kind {
                    MoniKind::Ascii(text) => record.note(text),
                    MoniKind::StateChange(text) => record.note(text),
                    _ => {}
                }
            }
        }
        Err(e) => record.note(format!("GET MONI DATA FAILED: {e}")),
    }
}
