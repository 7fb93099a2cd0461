//! Whole-pool runs through the orchestrator against emulated modules.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use channel::{DomAddr, DomSlot};
use message::ops::{facility, msghand};
use mockdom::{MockHub, MockResponse};
use orchestrator::{Orchestrator, RunOptions};
use testkit::PoolConfig;

/// Tests in the default pool.
const DEFAULT_POOL_SIZE: u32 = 15;

fn quick_config() -> PoolConfig {
    let mut config = PoolConfig::new();
    // Timed tests run for one second against the emulator.
    config.set_duration("moni", Duration::from_secs(1));
    config.set_duration("sn", Duration::from_secs(1));
    config.set_duration("waveform", Duration::from_secs(1));
    config
}

fn quick_options() -> RunOptions {
    RunOptions {
        cycles: 1,
        stop_on_fail: false,
        quiet: true,
        domapp_settle: Some(Duration::ZERO),
    }
}

fn orchestrate(hub: Arc<MockHub>, config: PoolConfig, options: RunOptions) -> Orchestrator {
    let provider: Arc<MockHub> = Arc::clone(&hub);
    Orchestrator::new(hub, provider, config, options)
}

/// The full default pool passes on every channel, concurrently.
#[test]
fn default_pool_passes_on_every_channel() {
    let _ = env_logger::builder().is_test(true).try_init();
    let hub = Arc::new(MockHub::new());
    for addr in [
        DomAddr::new(0, 0, DomSlot::A),
        DomAddr::new(0, 0, DomSlot::B),
        DomAddr::new(1, 2, DomSlot::A),
    ] {
        hub.add_dom(addr);
    }

    let summary = orchestrate(hub, quick_config(), quick_options())
        .run()
        .expect("run starts");
    assert_eq!(summary.counters.failed, 0);
    assert_eq!(summary.counters.total, DEFAULT_POOL_SIZE * 3);
    assert!(summary.all_passed());
}

/// Repeat counts add consecutive executions of a state-preserving test.
#[test]
fn repeat_count_adds_runs() {
    let hub = Arc::new(MockHub::new());
    hub.add_dom(DomAddr::new(0, 0, DomSlot::A));

    let mut config = quick_config();
    config.set_repeat("check-iceboot", 3);
    let summary = orchestrate(hub, config, quick_options())
        .run()
        .expect("run starts");
    assert_eq!(summary.counters.total, DEFAULT_POOL_SIZE + 2);
    assert_eq!(summary.counters.failed, 0);
}

/// Cycling repeats the whole pool.
#[test]
fn cycles_rerun_the_pool() {
    let hub = Arc::new(MockHub::new());
    hub.add_dom(DomAddr::new(0, 0, DomSlot::A));

    let mut options = quick_options();
    options.cycles = 2;
    let summary = orchestrate(hub, quick_config(), options)
        .run()
        .expect("run starts");
    assert_eq!(summary.counters.total, DEFAULT_POOL_SIZE * 2);
    assert_eq!(summary.counters.failed, 0);
}

/// A failure on one channel never disturbs its siblings.
#[test]
fn scripted_failure_stays_on_its_channel() {
    let hub = Arc::new(MockHub::new());
    let healthy = DomAddr::new(0, 0, DomSlot::A);
    let broken = DomAddr::new(0, 0, DomSlot::B);
    hub.add_dom(healthy);
    hub.add_dom(broken);
    hub.script(
        broken,
        facility::MESSAGE_HANDLER,
        msghand::GET_DOMAPP_RELEASE,
        MockResponse::Status(0xC8),
    );

    let summary = orchestrate(hub, quick_config(), quick_options())
        .run()
        .expect("run starts");
    assert_eq!(summary.counters.total, DEFAULT_POOL_SIZE * 2);
    assert_eq!(summary.counters.failed, 1);
}

/// stop-on-fail ends the failing channel at the first failure but still
/// reports everything that ran.
#[test]
fn stop_on_fail_cuts_the_run_short() {
    let hub = Arc::new(MockHub::new());
    let addr = DomAddr::new(0, 0, DomSlot::A);
    hub.add_dom(addr);
    hub.script(
        addr,
        facility::MESSAGE_HANDLER,
        msghand::GET_DOM_ID,
        MockResponse::Status(0xC8),
    );

    let mut options = quick_options();
    options.stop_on_fail = true;
    let summary = orchestrate(hub, quick_config(), options)
        .run()
        .expect("run starts");
    // Scheduler order from Iceboot: check, the boot walk, then the Domapp
    // block up to the failing id query.
    assert_eq!(summary.counters.failed, 1);
    assert_eq!(summary.counters.total, 10);
}

/// Only-if-selected tests stay out of the schedule until named; naming a
/// test narrows the state-preserving schedule to the named set.
#[test]
fn selection_controls_the_state_preserving_schedule() {
    let hub = Arc::new(MockHub::new());
    hub.add_dom(DomAddr::new(0, 0, DomSlot::A));
    let mut config = quick_config();
    config.allow_flasher = true;
    let summary = orchestrate(Arc::clone(&hub), config, quick_options())
        .run()
        .expect("run starts");
    // Unselected: the flasher test is in the pool but never scheduled.
    assert_eq!(summary.counters.total, DEFAULT_POOL_SIZE);

    let mut config = quick_config();
    config.allow_flasher = true;
    config.select("flasher-serial");
    let summary = orchestrate(hub, config, quick_options())
        .run()
        .expect("run starts");
    // Selected: six state-changing tests plus the named one.
    assert_eq!(summary.counters.total, 7);
    assert_eq!(summary.counters.failed, 0);
}

/// The HV opt-in adds the ramp test, which passes against the emulated
/// supply's perfect readback.
#[test]
fn hv_opt_in_runs_the_ramp() {
    let hub = Arc::new(MockHub::new());
    hub.add_dom(DomAddr::new(0, 0, DomSlot::A));

    let mut config = quick_config();
    config.allow_hv = true;
    let summary = orchestrate(hub, config, quick_options())
        .run()
        .expect("run starts");
    assert_eq!(summary.counters.total, DEFAULT_POOL_SIZE + 1);
    assert_eq!(summary.counters.failed, 0);
}

/// Cancellation makes every context abandon promptly; the summary still
/// arrives.
#[test]
fn cancellation_abandons_promptly() {
    let hub = Arc::new(MockHub::new());
    hub.add_dom(DomAddr::new(0, 0, DomSlot::A));
    hub.add_dom(DomAddr::new(0, 1, DomSlot::A));

    let mut config = quick_config();
    // Without cancellation this run would take half a minute per channel.
    config.set_duration("sn", Duration::from_secs(30));
    let orchestrator = Arc::new(orchestrate(hub, config, quick_options()));
    let cancel = orchestrator.cancel_flag();

    let started = Instant::now();
    let runner = {
        let orchestrator = Arc::clone(&orchestrator);
        thread::spawn(move || orchestrator.run().expect("run starts"))
    };
    thread::sleep(Duration::from_millis(500));
    cancel.cancel();
    let summary = runner.join().expect("runner thread");

    assert!(
        started.elapsed() < Duration::from_secs(10),
        "cancellation took {:?}",
        started.elapsed()
    );
    // Whatever ran before the cancel is still accounted for.
    assert!(summary.counters.total < DEFAULT_POOL_SIZE * 2);
}
