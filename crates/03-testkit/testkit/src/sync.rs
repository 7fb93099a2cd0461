//! Cancellation and rendezvous primitives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use channel::DomSlot;

/// Shared cancellation flag, checked between tests and inside timed
/// data-taking loops. Setting it never interrupts a rendezvous wait.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Single-use, single-waiter event.
///
/// Deliberately has no timed wait: the partner channel is trusted to
/// eventually reach the rendezvous, and a hung partner stalls only its
/// own pair.
#[derive(Debug, Default)]
pub struct OneShotEvent {
    set: Mutex<bool>,
    cond: Condvar,
}

impl OneShotEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the event, waking the waiter if it is already parked.
    pub fn signal(&self) {
        let mut set = self.set.lock();
        *set = true;
        self.cond.notify_one();
    }

    /// Blocks until the event has fired. Returns immediately if it
    /// already has.
    pub fn wait(&self) {
        let mut set = self.set.lock();
        while !*set {
            self.cond.wait(&mut set);
        }
    }

    /// Non-blocking check, for reporting only.
    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }
}

/// Which side of the rendezvous this channel plays.
///
/// Slot B announces readiness; slot A drives the shared power relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairRole {
    SlotA,
    SlotB,
}

impl From<DomSlot> for PairRole {
    fn from(slot: DomSlot) -> Self {
        match slot {
            DomSlot::A => PairRole::SlotA,
            DomSlot::B => PairRole::SlotB,
        }
    }
}

/// The two-phase barrier shared by one wire pair.
///
/// Created lazily by whichever channel reaches the synchronization point
/// first, found by the second, destroyed after both have observed the
/// finish phase.
#[derive(Debug, Default)]
pub struct PairLink {
    /// Phase 1: slot B is ready for power-off.
    pub start: OneShotEvent,
    /// Phase 2: the last module back in its runtime state has finished.
    pub finish: OneShotEvent,
}

impl PairLink {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A test's view of its rendezvous: the shared link plus its own role.
#[derive(Clone, Debug)]
pub struct PairHandle {
    pub link: Arc<PairLink>,
    pub role: PairRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn signal_before_wait_does_not_block() {
        let ev = OneShotEvent::new();
        ev.signal();
        ev.wait();
        assert!(ev.is_set());
    }

    #[test]
    fn wait_parks_until_signalled() {
        let ev = Arc::new(OneShotEvent::new());
        let waiter = {
            let ev = Arc::clone(&ev);
            thread::spawn(move || ev.wait())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        ev.signal();
        waiter.join().unwrap();
    }
}
