use std::time::Duration;

use session::BootMode;

use crate::ctx::TestCtx;
use crate::error::TestError;
use crate::record::TestRecord;

/// Static description of a test: identity, state contract, capabilities.
#[derive(Clone, Copy, Debug)]
pub struct TestInfo {
    /// Stable name used for selection, repeats, and duration overrides.
    pub name: &'static str,
    /// Boot mode the module must be in before `run`.
    pub start: BootMode,
    /// Boot mode the module is in after a successful `run`.
    pub end: BootMode,
    /// Default data-taking run length, for timed tests.
    pub run_length: Option<Duration>,
    /// Requires a high-voltage grant.
    pub needs_hv: bool,
    /// Requires the flasher-board opt-in.
    pub needs_flasher: bool,
    /// Power-cycles the shared relay; rendezvous-linked with the partner
    /// slot on the same wire pair.
    pub needs_power_cycle: bool,
    /// Runs only when explicitly selected.
    pub selected_only: bool,
}

impl TestInfo {
    /// Plain test with no capabilities and no run length.
    pub const fn new(name: &'static str, start: BootMode, end: BootMode) -> Self {
        Self {
            name,
            start,
            end,
            run_length: None,
            needs_hv: false,
            needs_flasher: false,
            needs_power_cycle: false,
            selected_only: false,
        }
    }

    pub const fn timed(mut self, run_length: Duration) -> Self {
        self.run_length = Some(run_length);
        self
    }

    pub const fn hv(mut self) -> Self {
        self.needs_hv = true;
        self
    }

    pub const fn flasher(mut self) -> Self {
        self.needs_flasher = true;
        self.selected_only = true;
        self
    }

    pub const fn power_cycle(mut self) -> Self {
        self.needs_power_cycle = true;
        self
    }

    /// True when start and end state are the same.
    pub fn state_preserving(&self) -> bool {
        self.start == self.end
    }
}

/// One unit of verification, bound to a single channel.
///
/// Instances are constructed fresh per (channel, scheduling slot), reset
/// before every run, and mutated only by their own `run` and the runner's
/// read-only reporting.
pub trait TestCase: Send {
    fn info(&self) -> TestInfo;

    fn record(&self) -> &TestRecord;

    fn record_mut(&mut self) -> &mut TestRecord;

    /// Executes the test. Protocol errors may be propagated with `?`; the
    /// runner converts an `Err` into FAIL with the error text appended,
    /// and the test still counts as run for repeat purposes.
    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError>;
}
