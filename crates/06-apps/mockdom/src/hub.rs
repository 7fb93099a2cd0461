use std::collections::BTreeMap;
use std::io::{self, ErrorKind};
use std::sync::Arc;

use parking_lot::Mutex;

use channel::{
    CardInfo, ChannelError, ChannelProvider, DomAddr, HubControl, PairInfo, RawDevice,
};

use crate::dom::{DomState, MockResponse};

/// Emulated hub holding any number of emulated modules.
///
/// Implements both collaborator traits so one `Arc<MockHub>` can serve as
/// hub control and channel provider at once.
#[derive(Default)]
pub struct MockHub {
    doms: Mutex<BTreeMap<DomAddr, Arc<Mutex<DomState>>>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module in Iceboot with a deterministic mainboard id.
    pub fn add_dom(&self, addr: DomAddr) {
        let id = format!("{:04x}{:04x}{:04x}", addr.card, addr.pair, addr.slot as u32);
        self.doms
            .lock()
            .insert(addr, Arc::new(Mutex::new(DomState::new(id))));
    }

    fn dom(&self, addr: DomAddr) -> Option<Arc<Mutex<DomState>>> {
        self.doms.lock().get(&addr).cloned()
    }

    fn dom_or_err(&self, addr: DomAddr) -> Result<Arc<Mutex<DomState>>, ChannelError> {
        self.dom(addr).ok_or_else(|| ChannelError::Open {
            addr,
            source: io::Error::from(ErrorKind::NotFound),
        })
    }

    /// Scripts the response for one (facility, subtype) on one module.
    pub fn script(&self, addr: DomAddr, facility: u8, subtype: u8, response: MockResponse) {
        if let Some(dom) = self.dom(addr) {
            dom.lock().script(facility, subtype, response);
        }
    }

    /// Queues a monitoring buffer on one module.
    pub fn push_moni(&self, addr: DomAddr, record: Vec<u8>) {
        if let Some(dom) = self.dom(addr) {
            dom.lock().push_moni(record);
        }
    }
}

struct MockDevice {
    state: Arc<Mutex<DomState>>,
}

impl RawDevice for MockDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if !state.powered || !state.has_output() {
            return Err(io::Error::from(ErrorKind::WouldBlock));
        }
        Ok(state.read_out(buf))
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if !state.powered {
            return Err(io::Error::from(ErrorKind::WouldBlock));
        }
        state.accept(buf);
        Ok(buf.len())
    }
}

impl ChannelProvider for MockHub {
    fn open(&self, addr: DomAddr) -> Result<Box<dyn RawDevice>, ChannelError> {
        let state = self.dom_or_err(addr)?;
        Ok(Box::new(MockDevice { state }))
    }

    fn softboot(&self, addr: DomAddr) -> Result<(), ChannelError> {
        let state = self.dom_or_err(addr)?;
        state.lock().reboot();
        Ok(())
    }

    fn comm_reset(&self, addr: DomAddr) -> Result<(), ChannelError> {
        let _ = self.dom_or_err(addr)?;
        Ok(())
    }

    fn comm_stats(&self, addr: DomAddr) -> Result<String, ChannelError> {
        let _ = self.dom_or_err(addr)?;
        Ok(format!("{addr}: RX ok TX ok\n"))
    }

    fn fpga_regs(&self, addr: DomAddr) -> Result<String, ChannelError> {
        let _ = self.dom_or_err(addr)?;
        Ok("FREV 0xdeadbeef\n".to_string())
    }
}

impl HubControl for MockHub {
    fn scan(&self) -> Result<Vec<CardInfo>, ChannelError> {
        let doms = self.doms.lock();
        let mut cards: BTreeMap<u32, BTreeMap<u32, bool>> = BTreeMap::new();
        for (addr, state) in doms.iter() {
            let powered = state.lock().powered;
            let pair = cards
                .entry(addr.card)
                .or_default()
                .entry(addr.pair)
                .or_insert(false);
            *pair |= powered;
        }
        Ok(cards
            .into_iter()
            .map(|(id, pairs)| CardInfo {
                id,
                pairs: pairs
                    .into_iter()
                    .map(|(pid, powered)| PairInfo {
                        id: pid,
                        plugged: true,
                        powered,
                    })
                    .collect(),
            })
            .collect())
    }

    fn communicating_doms(&self) -> Result<Vec<DomAddr>, ChannelError> {
        Ok(self
            .doms
            .lock()
            .iter()
            .filter(|(_, state)| state.lock().powered)
            .map(|(addr, _)| *addr)
            .collect())
    }

    fn release(&self) -> Result<String, ChannelError> {
        Ok("mockhub-1.0.0".to_string())
    }

    fn dom_id(&self, addr: DomAddr) -> Result<Option<String>, ChannelError> {
        Ok(self.dom(addr).map(|d| d.lock().mainboard_id.clone()))
    }

    fn set_blocking(&self, _blocking: bool) -> Result<(), ChannelError> {
        Ok(())
    }

    fn power_on(&self, card: u32, pair: u32) -> Result<(), ChannelError> {
        for (addr, state) in self.doms.lock().iter() {
            if addr.pair_key() == (card, pair) {
                let mut state = state.lock();
                state.powered = true;
                state.reboot();
            }
        }
        Ok(())
    }

    fn power_off(&self, card: u32, pair: u32) -> Result<(), ChannelError> {
        for (addr, state) in self.doms.lock().iter() {
            if addr.pair_key() == (card, pair) {
                state.lock().powered = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel::DomSlot;

    #[test]
    fn power_cycle_reboots_both_slots_of_the_pair() {
        let hub = MockHub::new();
        let a = DomAddr::new(0, 0, DomSlot::A);
        let b = a.partner();
        let other = DomAddr::new(0, 1, DomSlot::A);
        hub.add_dom(a);
        hub.add_dom(b);
        hub.add_dom(other);

        hub.power_off(0, 0).unwrap();
        assert_eq!(hub.communicating_doms().unwrap(), vec![other]);

        hub.power_on(0, 0).unwrap();
        assert_eq!(hub.communicating_doms().unwrap().len(), 3);
    }

    #[test]
    fn scan_groups_modules_into_cards_and_pairs() {
        let hub = MockHub::new();
        hub.add_dom(DomAddr::new(1, 0, DomSlot::A));
        hub.add_dom(DomAddr::new(1, 0, DomSlot::B));
        hub.add_dom(DomAddr::new(1, 3, DomSlot::A));
        let cards = hub.scan().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, 1);
        assert_eq!(cards[0].pairs.len(), 2);
    }
}
