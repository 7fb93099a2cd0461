//! Test-case model shared by the test library, scheduler, and runner.
//!
//! A test declares its required start state, resulting end state, and
//! capability needs as plain data; the runner grants capabilities by
//! composition (an HV token, a rendezvous link, a run length) rather than
//! through any inheritance scheme.

mod case;
mod config;
mod ctx;
mod error;
mod record;
mod sync;

pub use case::{TestCase, TestInfo};
pub use config::PoolConfig;
pub use ctx::TestCtx;
pub use error::TestError;
pub use record::{TestRecord, Verdict};
pub use sync::{CancelFlag, OneShotEvent, PairHandle, PairLink, PairRole};
