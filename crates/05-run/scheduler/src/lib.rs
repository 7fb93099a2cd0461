//! State-minimizing test ordering.
//!
//! Given a pool of tests tagged with required start and resulting end boot
//! modes, the scheduler yields an execution order that exhausts every
//! state-preserving test reachable in the current mode before taking any
//! state change, repeats tests per configuration, and refuses up front any
//! configuration that would repeat a state-changing test.

use thiserror::Error;

use session::BootMode;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Repeating a state-changing test would desynchronize the tracked
    /// state from the module's real state; detected before any test runs.
    #[error("test {name} changes state {start}->{end} but has repeat count {repeats}")]
    RepeatedStateChange {
        name: String,
        start: BootMode,
        end: BootMode,
        repeats: u32,
    },
}

/// One pool entry as the scheduler sees it.
///
/// `enabled` is the resolved only-if-selected flag. Disabled entries are
/// skipped by the state-preserving branch, but a disabled state-changing
/// entry still runs once: the pool must reach its declared end state.
#[derive(Clone, Debug)]
pub struct ScheduleSpec {
    pub name: String,
    pub start: BootMode,
    pub end: BootMode,
    pub repeats: u32,
    pub enabled: bool,
}

#[derive(Clone, Debug)]
struct Entry {
    spec: ScheduleSpec,
    remaining: u32,
}

/// Lazy, restartable execution order over one channel's pool.
///
/// `next` performs live selection against the tracked boot mode; indices
/// returned are positions in the entry list handed to `new`. Declaration
/// order is the tie-break in both branches, so the pool order encodes the
/// intended boot sequence.
#[derive(Debug)]
pub struct Scheduler {
    entries: Vec<Entry>,
    state: BootMode,
}

impl Scheduler {
    /// Validates the pool and binds it to the channel's current state.
    pub fn new(specs: Vec<ScheduleSpec>, start: BootMode) -> Result<Self, ScheduleError> {
        for spec in &specs {
            if spec.repeats > 1 && spec.start != spec.end {
                return Err(ScheduleError::RepeatedStateChange {
                    name: spec.name.clone(),
                    start: spec.start,
                    end: spec.end,
                    repeats: spec.repeats,
                });
            }
        }
        let entries = specs
            .into_iter()
            .map(|spec| {
                let remaining = if !spec.enabled && spec.start == spec.end {
                    0
                } else {
                    spec.repeats.max(1)
                };
                Entry { spec, remaining }
            })
            .collect();
        Ok(Self {
            entries,
            state: start,
        })
    }

    /// The boot mode the module is expected to be in right now.
    pub fn state(&self) -> BootMode {
        self.state
    }

    /// Total executions still owed across the pool.
    pub fn remaining(&self) -> u32 {
        self.entries.iter().map(|e| e.remaining).sum()
    }

    /// Names of entries that still owe executions. Non-empty after `next`
    /// returns `None` means the pool has no path from the current state.
    pub fn stranded(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.remaining > 0)
            .map(|e| e.spec.name.as_str())
            .collect()
    }

    /// Selects the next test to run, returning its pool index.
    ///
    /// State-preserving entries in the current mode are exhausted first,
    /// in declaration order; then the first state-changing entry whose
    /// start matches is taken and its end state adopted.
    pub fn next(&mut self) -> Option<usize> {
        // State-preserving branch.
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if entry.remaining > 0
                && entry.spec.enabled
                && entry.spec.start == self.state
                && entry.spec.end == self.state
            {
                entry.remaining -= 1;
                return Some(idx);
            }
        }
        // State-changing branch.
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if entry.remaining > 0 && entry.spec.start == self.state && entry.spec.end != self.state
            {
                entry.remaining -= 1;
                self.state = entry.spec.end;
                return Some(idx);
            }
        }
        None
    }
}
