//! Concurrent execution of the test pool across every detected channel.
//!
//! One OS thread per channel; channels are fully independent except for
//! the summary counters and the power-cycle pair registry, each behind
//! its own mutex and never held in nested fashion. All console reporting
//! happens under the counter lock so interleaved output stays readable.

mod registry;
mod report;
mod run;
mod worker;

pub use registry::PairRegistry;
pub use report::{Reporter, RunCounters, Summary};
pub use run::{Orchestrator, OrchestratorError, RunOptions};
pub use testkit::CancelFlag;
