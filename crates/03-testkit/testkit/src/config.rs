use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Per-run pool configuration, built once from the command line and
/// read-only during scheduling.
#[derive(Clone, Debug, Default)]
pub struct PoolConfig {
    repeats: HashMap<String, u32>,
    durations: HashMap<String, Duration>,
    selected: HashSet<String>,
    pub allow_hv: bool,
    pub allow_flasher: bool,
    pub allow_power_cycle: bool,
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_repeat(&mut self, name: impl Into<String>, count: u32) {
        self.repeats.insert(name.into(), count);
    }

    pub fn set_duration(&mut self, name: impl Into<String>, duration: Duration) {
        self.durations.insert(name.into(), duration);
    }

    /// Explicitly selects a test, enabling it even if it is
    /// only-if-selected.
    pub fn select(&mut self, name: impl Into<String>) {
        self.selected.insert(name.into());
    }

    /// Configured repeat count; defaults to one.
    pub fn repeat_for(&self, name: &str) -> u32 {
        self.repeats.get(name).copied().unwrap_or(1)
    }

    /// Duration override, if any.
    pub fn duration_for(&self, name: &str) -> Option<Duration> {
        self.durations.get(name).copied()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// True when the user named at least one test explicitly.
    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }
}
