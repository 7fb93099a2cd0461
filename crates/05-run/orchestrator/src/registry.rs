use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use channel::DomAddr;
use testkit::{PairHandle, PairLink};

/// Key: the shared wire pair plus the pool cycle it belongs to. Including
/// the cycle keeps a fast channel from re-joining a stale link while its
/// partner is still finishing the previous cycle's rendezvous.
type PairKey = (u32, u32, u32);

struct PairEntry {
    link: Arc<PairLink>,
    members: u8,
}

/// Lazily links the two power-cycle test instances of one wire pair.
///
/// The first context to arrive allocates the link under the registry
/// mutex; the second finds it. Entries are dropped once both members have
/// left, after observing the finish phase. No waiting ever happens under
/// this lock.
#[derive(Default)]
pub struct PairRegistry {
    pairs: Mutex<HashMap<PairKey, PairEntry>>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the rendezvous for `addr`'s wire pair in `cycle`.
    pub fn join(&self, addr: DomAddr, cycle: u32) -> PairHandle {
        let (card, pair) = addr.pair_key();
        let mut pairs = self.pairs.lock();
        let entry = pairs.entry((card, pair, cycle)).or_insert_with(|| PairEntry {
            link: Arc::new(PairLink::new()),
            members: 0,
        });
        entry.members += 1;
        PairHandle {
            link: Arc::clone(&entry.link),
            role: addr.slot.into(),
        }
    }

    /// Releases `addr`'s membership; the entry disappears when the second
    /// member leaves.
    pub fn leave(&self, addr: DomAddr, cycle: u32) {
        let (card, pair) = addr.pair_key();
        let mut pairs = self.pairs.lock();
        if let Some(entry) = pairs.get_mut(&(card, pair, cycle)) {
            entry.members = entry.members.saturating_sub(1);
            if entry.members == 0 {
                pairs.remove(&(card, pair, cycle));
            }
        }
    }

    /// Number of live pair links, for tests and diagnostics.
    pub fn live_pairs(&self) -> usize {
        self.pairs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel::DomSlot;
    use testkit::PairRole;

    #[test]
    fn both_slots_share_one_link() {
        let registry = PairRegistry::new();
        let a = registry.join(DomAddr::new(0, 1, DomSlot::A), 0);
        let b = registry.join(DomAddr::new(0, 1, DomSlot::B), 0);
        assert!(Arc::ptr_eq(&a.link, &b.link));
        assert_eq!(a.role, PairRole::SlotA);
        assert_eq!(b.role, PairRole::SlotB);
        assert_eq!(registry.live_pairs(), 1);
    }

    #[test]
    fn different_pairs_and_cycles_get_distinct_links() {
        let registry = PairRegistry::new();
        let a = registry.join(DomAddr::new(0, 1, DomSlot::A), 0);
        let other_pair = registry.join(DomAddr::new(0, 2, DomSlot::A), 0);
        let other_cycle = registry.join(DomAddr::new(0, 1, DomSlot::B), 1);
        assert!(!Arc::ptr_eq(&a.link, &other_pair.link));
        assert!(!Arc::ptr_eq(&a.link, &other_cycle.link));
        assert_eq!(registry.live_pairs(), 3);
    }

    #[test]
    fn entry_is_destroyed_when_both_members_leave() {
        let registry = PairRegistry::new();
        let addr_a = DomAddr::new(2, 0, DomSlot::A);
        let addr_b = addr_a.partner();
        let _a = registry.join(addr_a, 0);
        let _b = registry.join(addr_b, 0);
        registry.leave(addr_a, 0);
        assert_eq!(registry.live_pairs(), 1);
        registry.leave(addr_b, 0);
        assert_eq!(registry.live_pairs(), 0);
    }
}
