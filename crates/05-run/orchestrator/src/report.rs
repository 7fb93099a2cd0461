use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;

use channel::DomAddr;
use testkit::{TestInfo, TestRecord, Verdict};

/// Shared pass/fail/total counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub passed: u32,
    pub failed: u32,
    pub total: u32,
}

/// Aggregate result of a whole run.
#[derive(Clone, Copy, Debug)]
pub struct Summary {
    pub counters: RunCounters,
    pub elapsed: Duration,
}

impl Summary {
    /// True when every executed test passed.
    pub fn all_passed(&self) -> bool {
        self.counters.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Passed tests: {}   Failed tests: {}   Total: {}   ({:.1} s)",
            self.counters.passed,
            self.counters.failed,
            self.counters.total,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Serializes result recording and console output.
///
/// Counter updates and printing happen under one lock so per-test lines
/// from concurrent channels never interleave mid-line. Failures print
/// their full diagnostic log inline, at occurrence time.
pub struct Reporter {
    counters: Mutex<RunCounters>,
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            counters: Mutex::new(RunCounters::default()),
            quiet,
        }
    }

    /// Records one finished test and prints its result line.
    ///
    /// A test that set no verdict is counted as a failure; every test is
    /// expected to classify itself.
    pub fn record(&self, addr: DomAddr, info: &TestInfo, record: &TestRecord) {
        let mut counters = self.counters.lock();
        counters.total += 1;
        let passed = record.verdict() == Some(Verdict::Pass);
        if passed {
            counters.passed += 1;
        } else {
            counters.failed += 1;
        }
        if !self.quiet {
            let verdict = match record.verdict() {
                Some(Verdict::Pass) => "PASS",
                Some(Verdict::Fail) => "FAIL",
                None => "FAIL (no verdict)",
            };
            println!(
                "{addr} {}->{} {}: {verdict} {}",
                info.start,
                info.end,
                info.name,
                record.summary()
            );
        }
        if !passed {
            let debug = record.debug_text();
            println!("################################################");
            if !debug.is_empty() {
                print!("{debug}");
            }
            println!("################################################");
        }
    }

    pub fn counters(&self) -> RunCounters {
        *self.counters.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel::DomSlot;
    use session::BootMode::Iceboot;

    #[test]
    fn counters_track_verdicts() {
        let reporter = Reporter::new(true);
        let info = TestInfo::new("check-iceboot", Iceboot, Iceboot);
        let addr = DomAddr::new(0, 0, DomSlot::A);

        let mut rec = TestRecord::new();
        rec.pass();
        reporter.record(addr, &info, &rec);

        rec.reset();
        rec.fail("nope");
        reporter.record(addr, &info, &rec);

        // No verdict at all still counts as a failure.
        rec.reset();
        reporter.record(addr, &info, &rec);

        assert_eq!(
            reporter.counters(),
            RunCounters {
                passed: 1,
                failed: 2,
                total: 3
            }
        );
    }
}
