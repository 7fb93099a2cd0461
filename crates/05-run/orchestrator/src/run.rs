use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use thiserror::Error;

use channel::{ChannelError, ChannelProvider, HubControl};
use testkit::{CancelFlag, PoolConfig};

use crate::registry::PairRegistry;
use crate::report::{Reporter, Summary};
use crate::worker::{run_channel, WorkerEnv};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("cannot enumerate channels: {0}")]
    Enumerate(#[source] ChannelError),

    #[error("cannot configure hub: {0}")]
    Hub(#[source] ChannelError),
}

/// Run-wide options, distinct from pool configuration.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Full-pool cycles per channel.
    pub cycles: u32,
    /// End a channel's run at its first failure.
    pub stop_on_fail: bool,
    /// Suppress per-test result lines; failures and the final summary
    /// still print.
    pub quiet: bool,
    /// Override for the Domapp settle delay; emulated modules use zero.
    pub domapp_settle: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cycles: 1,
            stop_on_fail: false,
            quiet: false,
            domapp_settle: None,
        }
    }
}

/// Top-level runner: enumerates channels, spawns one execution context
/// per channel, joins them, and aggregates the summary.
pub struct Orchestrator {
    hub: Arc<dyn HubControl>,
    provider: Arc<dyn ChannelProvider>,
    config: PoolConfig,
    options: RunOptions,
    cancel: CancelFlag,
}

impl Orchestrator {
    pub fn new(
        hub: Arc<dyn HubControl>,
        provider: Arc<dyn ChannelProvider>,
        config: PoolConfig,
        options: RunOptions,
    ) -> Self {
        Self {
            hub,
            provider,
            config,
            options,
            cancel: CancelFlag::new(),
        }
    }

    /// Flag to wire into an interrupt handler. Cancelling makes every
    /// context abandon its current work promptly and proceed to the
    /// final summary.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs the configured pool on every communicating module.
    ///
    /// Enumeration failure is fatal to the whole run; per-channel setup
    /// failures abort only that channel. The summary is produced even if
    /// some channels aborted.
    pub fn run(&self) -> Result<Summary, OrchestratorError> {
        let start = Instant::now();

        self.hub
            .set_blocking(false)
            .map_err(OrchestratorError::Hub)?;
        match self.hub.release() {
            Ok(release) => info!("hub driver release: {release}"),
            Err(e) => warn!("hub driver release unavailable: {e}"),
        }
        let doms = self
            .hub
            .communicating_doms()
            .map_err(OrchestratorError::Enumerate)?;
        info!("{} communicating module(s)", doms.len());

        let reporter = Arc::new(Reporter::new(self.options.quiet));
        let registry = Arc::new(PairRegistry::new());

        let mut handles = Vec::with_capacity(doms.len());
        for addr in doms {
            let env = WorkerEnv {
                hub: Arc::clone(&self.hub),
                provider: Arc::clone(&self.provider),
                config: self.config.clone(),
                options: self.options.clone(),
                reporter: Arc::clone(&reporter),
                registry: Arc::clone(&registry),
                cancel: self.cancel.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("dom-{addr}"))
                .spawn(move || run_channel(env, addr));
            match handle {
                Ok(handle) => handles.push((addr, handle)),
                Err(e) => error!("{addr}: cannot spawn channel thread: {e}"),
            }
        }

        for (addr, handle) in handles {
            if handle.join().is_err() {
                error!("{addr}: channel thread panicked");
            }
        }

        Ok(Summary {
            counters: reporter.counters(),
            elapsed: start.elapsed(),
        })
    }
}
