//! Shared fixtures for the integration suites.

use std::sync::Arc;
use std::time::Duration;

use channel::{ByteChannel, DomAddr, DomSlot};
use mockdom::MockHub;
use session::Session;

/// Canonical single-module address used across the suites.
pub fn addr() -> DomAddr {
    DomAddr::new(0, 0, DomSlot::A)
}

/// One emulated module, ready to talk.
pub fn hub_with_one_dom() -> (Arc<MockHub>, DomAddr) {
    let hub = Arc::new(MockHub::new());
    let addr = addr();
    hub.add_dom(addr);
    (hub, addr)
}

/// Opens a session with no Domapp settle delay.
pub fn open_session(hub: &Arc<MockHub>, addr: DomAddr) -> Session {
    let provider: Arc<MockHub> = Arc::clone(hub);
    let chan = ByteChannel::open(provider, addr).expect("open mock channel");
    let mut session = Session::new(chan);
    session.set_settle(Duration::ZERO);
    session
}

/// Boots the emulated module into Domapp mode.
pub fn session_in_domapp(hub: &Arc<MockHub>, addr: DomAddr) -> Session {
    let mut session = open_session(hub, addr);
    let outcome = session.iceboot_to_domapp().expect("transition I/O");
    assert!(outcome.ok, "mock module should enter domapp: {}", outcome.diagnostic);
    session
}
