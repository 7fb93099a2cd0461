//! Rendezvous ordering under many randomized interleavings, plus the
//! full power-cycle path through the orchestrator.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use channel::{DomAddr, DomSlot};
use mockdom::MockHub;
use orchestrator::{Orchestrator, PairRegistry, RunOptions};
use testkit::{PairRole, PoolConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    BReady,
    APowerCycle,
    BResumed,
}

/// Slot B's "ready" must always precede slot A's power cycle, for every
/// interleaving the scheduler can produce.
#[test]
fn slot_b_ready_always_precedes_the_power_cycle() {
    for seed in 0..1000u64 {
        let registry = Arc::new(PairRegistry::new());
        let trace: Arc<Mutex<Vec<Step>>> = Arc::new(Mutex::new(Vec::new()));
        let addr_a = DomAddr::new(0, 0, DomSlot::A);
        let addr_b = addr_a.partner();

        let mut rng = StdRng::seed_from_u64(seed);
        let delay_a = Duration::from_micros(rng.gen_range(0..500));
        let delay_b = Duration::from_micros(rng.gen_range(0..500));

        let side_a = {
            let registry = Arc::clone(&registry);
            let trace = Arc::clone(&trace);
            thread::spawn(move || {
                thread::sleep(delay_a);
                let handle = registry.join(addr_a, 0);
                assert_eq!(handle.role, PairRole::SlotA);
                handle.link.start.wait();
                trace.lock().push(Step::APowerCycle);
                handle.link.finish.signal();
                registry.leave(addr_a, 0);
            })
        };
        let side_b = {
            let registry = Arc::clone(&registry);
            let trace = Arc::clone(&trace);
            thread::spawn(move || {
                thread::sleep(delay_b);
                let handle = registry.join(addr_b, 0);
                assert_eq!(handle.role, PairRole::SlotB);
                trace.lock().push(Step::BReady);
                handle.link.start.signal();
                handle.link.finish.wait();
                trace.lock().push(Step::BResumed);
                registry.leave(addr_b, 0);
            })
        };
        side_a.join().expect("slot A thread");
        side_b.join().expect("slot B thread");

        let trace = trace.lock();
        let ready = trace.iter().position(|s| *s == Step::BReady);
        let cycle = trace.iter().position(|s| *s == Step::APowerCycle);
        let resumed = trace.iter().position(|s| *s == Step::BResumed);
        assert!(
            ready < cycle && cycle < resumed,
            "seed {seed}: bad order {trace:?}"
        );
        assert_eq!(registry.live_pairs(), 0, "seed {seed}: link leaked");
    }
}

/// Both slots of a pair pass the power-cycle test end to end, and only
/// that pair is serialized.
#[test]
fn power_cycle_pair_runs_end_to_end() {
    let hub = Arc::new(MockHub::new());
    let a = DomAddr::new(0, 0, DomSlot::A);
    hub.add_dom(a);
    hub.add_dom(a.partner());

    let mut config = PoolConfig::new();
    config.allow_power_cycle = true;
    config.set_duration("moni", Duration::from_secs(1));
    config.set_duration("sn", Duration::from_secs(1));
    config.set_duration("waveform", Duration::from_secs(1));

    let options = RunOptions {
        cycles: 1,
        stop_on_fail: false,
        quiet: true,
        domapp_settle: Some(Duration::ZERO),
    };
    let provider: Arc<MockHub> = Arc::clone(&hub);
    let summary = Orchestrator::new(hub, provider, config, options)
        .run()
        .expect("run starts");

    // Default pool plus the power-cycle test, on both channels.
    assert_eq!(summary.counters.total, 16 * 2);
    assert_eq!(summary.counters.failed, 0);
}
