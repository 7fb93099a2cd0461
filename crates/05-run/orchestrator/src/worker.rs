use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};

use channel::{ByteChannel, ChannelProvider, DomAddr, HubControl};
use domtests::standard_pool;
use message::HvToken;
use scheduler::{ScheduleSpec, Scheduler};
use session::{BootMode, Session};
use testkit::{CancelFlag, PoolConfig, TestCase, TestCtx, TestInfo};

use crate::registry::PairRegistry;
use crate::report::Reporter;
use crate::run::RunOptions;

/// Fallback run length for timed tests with no default and no override.
const DEFAULT_RUN_LENGTH: Duration = Duration::from_secs(10);

/// Everything one channel thread needs; clones are cheap Arc bumps.
#[derive(Clone)]
pub(crate) struct WorkerEnv {
    pub hub: Arc<dyn HubControl>,
    pub provider: Arc<dyn ChannelProvider>,
    pub config: PoolConfig,
    pub options: RunOptions,
    pub reporter: Arc<Reporter>,
    pub registry: Arc<PairRegistry>,
    pub cancel: CancelFlag,
}

/// Resolves the scheduler's view of one pool entry.
///
/// Only-if-selected tests are enabled by naming them; an explicit test
/// selection also narrows the ordinary state-preserving tests to the
/// named set. State-changing tests stay in regardless: the pool must
/// still walk its boot sequence.
fn schedule_spec(info: &TestInfo, config: &PoolConfig) -> ScheduleSpec {
    let enabled = if info.selected_only {
        config.is_selected(info.name)
    } else if config.has_selection() && info.state_preserving() {
        config.is_selected(info.name)
    } else {
        true
    };
    ScheduleSpec {
        name: info.name.to_string(),
        start: info.start,
        end: info.end,
        repeats: config.repeat_for(info.name),
        enabled,
    }
}

/// Runs the whole configured pool on one channel, cycle by cycle.
///
/// Setup failures (open, invalid pool) abort this channel only; sibling
/// channels are unaffected.
pub(crate) fn run_channel(env: WorkerEnv, addr: DomAddr) {
    let chan = match ByteChannel::open(Arc::clone(&env.provider), addr) {
        Ok(chan) => chan,
        Err(e) => {
            error!("{addr}: cannot open channel: {e}");
            dump_diagnostics(&env, addr);
            return;
        }
    };
    let mut session = Session::new(chan);
    if let Some(settle) = env.options.domapp_settle {
        session.set_settle(settle);
    }

    // The harness assumes modules start in Iceboot; the first prompt
    // check in the pool verifies it.
    let mut state = BootMode::Iceboot;

    for cycle in 0..env.options.cycles.max(1) {
        if env.cancel.is_cancelled() {
            info!("{addr}: cancelled before cycle {cycle}");
            return;
        }
        debug!("{addr}: cycle {cycle} from state {state}");

        let mut pool = standard_pool(&env.config);
        let specs = pool
            .iter()
            .map(|t| schedule_spec(&t.info(), &env.config))
            .collect();
        let mut sched = match Scheduler::new(specs, state) {
            Ok(sched) => sched,
            Err(e) => {
                error!("{addr}: invalid pool configuration: {e}");
                return;
            }
        };

        while let Some(idx) = sched.next() {
            if env.cancel.is_cancelled() {
                info!("{addr}: cancelled, skipping to final report");
                return;
            }
            let test = &mut *pool[idx];
            let info = test.info();
            run_one(&env, &mut session, test, &info, cycle);

            // State changes invalidate buffered driver I/O state.
            if info.start != info.end {
                if let Err(e) = session.channel_mut().reopen() {
                    error!("{addr}: reopen after {} failed: {e}", info.name);
                    dump_diagnostics(&env, addr);
                    return;
                }
            }
            if env.options.stop_on_fail && test.record().failed() {
                info!("{addr}: stopping at first failure");
                return;
            }
        }

        if sched.remaining() > 0 {
            error!(
                "{addr}: no runnable test from state {}; stranded: {:?}",
                sched.state(),
                sched.stranded()
            );
            return;
        }
        state = sched.state();
    }
}

/// Dumps the read-only hub diagnostics for a dying channel. Never used
/// for protocol decisions.
fn dump_diagnostics(env: &WorkerEnv, addr: DomAddr) {
    if let Ok(stats) = env.provider.comm_stats(addr) {
        debug!("{addr}: comm stats:\n{stats}");
    }
    if let Ok(regs) = env.provider.fpga_regs(addr) {
        debug!("{addr}: fpga regs:\n{regs}");
    }
}

fn run_one(
    env: &WorkerEnv,
    session: &mut Session,
    test: &mut dyn TestCase,
    info: &TestInfo,
    cycle: u32,
) {
    let addr = session.channel().addr();
    test.record_mut().reset();

    let hv = info.needs_hv.then(HvToken::grant);
    let pair = info
        .needs_power_cycle
        .then(|| env.registry.join(addr, cycle));
    let run_length = env
        .config
        .duration_for(info.name)
        .or(info.run_length)
        .unwrap_or(DEFAULT_RUN_LENGTH);

    let result = {
        let mut ctx = TestCtx {
            session,
            hub: env.hub.as_ref(),
            hv: hv.as_ref(),
            run_length,
            pair,
            cancel: env.cancel.clone(),
        };
        test.run(&mut ctx)
    };
    if info.needs_power_cycle {
        env.registry.leave(addr, cycle);
    }

    // An error escaping the test boundary is a failure of that test, not
    // of the channel; it still counts as run for repeat purposes.
    if let Err(e) = result {
        test.record_mut().fail(e.to_string());
    }
    env.reporter.record(addr, info, test.record());
}
