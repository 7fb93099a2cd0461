//! Timed data-taking tests: monitoring, supernova scalers, waveforms.

use std::time::Duration;

use channel::PollTimer;
use message::{sn_clock_continuous, EngFormat, MoniRecord, PulserMode, SnRecord};
use session::BootMode::Domapp;
use testkit::{TestCase, TestCtx, TestError, TestInfo, TestRecord};

use crate::util::{log_moni, set_default_dacs};

/// Default data-taking run length.
const RUN_LENGTH: Duration = Duration::from_secs(10);
/// Monitoring intervals in module clock ticks (hardware, configuration).
const MONI_HW_IVAL: u32 = 40_000_000;
const MONI_CF_IVAL: u32 = 1_200_000_000;
/// Discriminator-triggered (SPE) mode.
const TRIGGER_SPE: u8 = 2;

/// Pulls monitoring records for the run length and checks their framing.
#[derive(Default)]
pub struct MoniTest {
    record: TestRecord,
}

impl MoniTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for MoniTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("moni", Domapp, Domapp).timed(RUN_LENGTH)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let run_len = ctx.run_length;
        let cancel = ctx.cancel.clone();
        let mut da = ctx.domapp();
        da.reset_moni_buffer()?;
        set_default_dacs(&mut da)?;
        da.set_moni_intervals(MONI_HW_IVAL, MONI_CF_IVAL)?;

        let timer = PollTimer::new(run_len);
        let mut total = 0usize;
        while !timer.expired() && !cancel.is_cancelled() {
            let buf = da.get_moni_data()?;
            if buf.is_empty() {
                timer.sleep(Duration::from_millis(200));
                continue;
            }
            let records = MoniRecord::parse_buffer(&buf);
            let spanned: usize = records.iter().map(|r| r.len as usize).sum();
            if spanned != buf.len() {
                self.record.fail(format!(
                    "monitoring framing: {} of {} bytes in well-framed records",
                    spanned,
                    buf.len()
                ));
                return Ok(());
            }
            total += records.len();
        }
        self.record.set_summary(format!("{total} monitoring records"));
        self.record.pass();
        Ok(())
    }
}

/// Supernova-scaler run with the clock continuity check.
#[derive(Default)]
pub struct SnTest {
    record: TestRecord,
}

impl SnTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for SnTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("sn", Domapp, Domapp).timed(RUN_LENGTH)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let run_len = ctx.run_length;
        let cancel = ctx.cancel.clone();
        let mut da = ctx.domapp();

        let setup = (|| -> Result<(), TestError> {
            da.reset_moni_buffer()?;
            set_default_dacs(&mut da)?;
            da.set_trigger_mode(TRIGGER_SPE)?;
            da.set_pulser(PulserMode::FrontEnd, Some(100))?;
            da.select_mux(255)?;
            let fmt = EngFormat::coded(0, [2, 2, 2, 2], [32, 0, 0, 0])
                .ok_or_else(|| TestError::other("unsupported engineering format"))?;
            da.set_eng_format(fmt)?;
            da.enable_sn(6400, 0)?;
            da.set_moni_intervals(MONI_HW_IVAL, MONI_CF_IVAL)?;
            da.begin_run()?;
            Ok(())
        })();
        if let Err(e) = setup {
            self.record.fail(e.to_string());
            log_moni(&mut da, &mut self.record);
            return Ok(());
        }

        let timer = PollTimer::new(run_len);
        let mut prev: Option<SnRecord> = None;
        let mut records = 0usize;
        loop {
            if timer.expired() || cancel.is_cancelled() {
                break;
            }
            log_moni(&mut da, &mut self.record);

            let buf = match da.get_sn_data() {
                Ok(buf) => buf,
                Err(e) => {
                    self.record.fail(format!("GET SN DATA FAILED: {e}"));
                    break;
                }
            };
            if buf.is_empty() {
                timer.sleep(Duration::from_secs(1));
                continue;
            }
            let rec = match SnRecord::parse(&buf) {
                Some(rec) => rec,
                None => {
                    self.record
                        .fail(format!("SN DATA CHECK: {} bytes", buf.len()));
                    break;
                }
            };
            if let Some(prev) = &prev {
                if !sn_clock_continuous(prev, &rec) {
                    self.record.fail(format!(
                        "CLOCK CHECK: bins {}->{} clock {:x}->{:x}",
                        prev.bins(),
                        rec.bins(),
                        prev.clock,
                        rec.clock
                    ));
                    log_moni(&mut da, &mut self.record);
                    break;
                }
            }
            records += 1;
            prev = Some(rec);
            timer.sleep(Duration::from_secs(1));
        }

        if !self.record.failed() {
            self.record
                .set_summary(format!("{records} supernova records"));
            self.record.pass();
        }

        // The run must always be ended, even after a failure above.
        if let Err(e) = da.end_run() {
            self.record.fail(format!("END RUN FAILED: {e}"));
            log_moni(&mut da, &mut self.record);
        }
        Ok(())
    }
}

/// Delta-compressed waveform run; pulls the lookback buffer for the run
/// length and checks only that data keeps flowing.
#[derive(Default)]
pub struct WaveformTest {
    record: TestRecord,
}

impl WaveformTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for WaveformTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("waveform", Domapp, Domapp).timed(RUN_LENGTH)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let run_len = ctx.run_length;
        let cancel = ctx.cancel.clone();
        let mut da = ctx.domapp();

        let setup = (|| -> Result<(), TestError> {
            da.reset_moni_buffer()?;
            set_default_dacs(&mut da)?;
            da.set_trigger_mode(TRIGGER_SPE)?;
            da.set_pulser(PulserMode::Beacon, Some(100))?;
            da.select_mux(255)?;
            da.set_moni_intervals(MONI_HW_IVAL, MONI_CF_IVAL)?;
            da.set_data_format(2)?;
            da.set_compression_mode(2)?;
            da.begin_run()?;
            Ok(())
        })();
        if let Err(e) = setup {
            self.record.fail(e.to_string());
            log_moni(&mut da, &mut self.record);
            return Ok(());
        }

        let timer = PollTimer::new(run_len);
        let mut total_bytes = 0usize;
        while !timer.expired() && !cancel.is_cancelled() {
            log_moni(&mut da, &mut self.record);
            match da.get_waveform_data() {
                Ok(buf) => {
                    total_bytes += buf.len();
                    if buf.is_empty() {
                        timer.sleep(Duration::from_millis(100));
                    }
                }
                Err(e) => {
                    self.record.fail(format!("GET WAVEFORM DATA FAILED: {e}"));
                    log_moni(&mut da, &mut self.record);
                    break;
                }
            }
        }

        if !self.record.failed() {
            self.record
                .set_summary(format!("{total_bytes} waveform bytes"));
            self.record.pass();
        }

        if let Err(e) = da.end_run() {
            self.record.fail(format!("END RUN FAILED: {e}"));
            log_moni(&mut da, &mut self.record);
        }
        Ok(())
    }
}
