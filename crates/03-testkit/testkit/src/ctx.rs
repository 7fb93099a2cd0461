use std::time::Duration;

use channel::HubControl;
use message::{DomApp, HvToken};
use session::Session;

use crate::sync::{CancelFlag, PairHandle};

/// Everything a test body may touch while it runs.
///
/// Capabilities arrive here explicitly: an HV grant only for HV-capable
/// tests, a rendezvous handle only for power-cycle tests, the effective
/// run length already resolved against configuration overrides.
pub struct TestCtx<'a> {
    pub session: &'a mut Session,
    pub hub: &'a dyn HubControl,
    pub hv: Option<&'a HvToken>,
    pub run_length: Duration,
    pub pair: Option<PairHandle>,
    pub cancel: CancelFlag,
}

impl<'a> TestCtx<'a> {
    /// Typed message client over this context's channel. Valid only while
    /// the module is in Domapp mode.
    pub fn domapp(&mut self) -> DomApp<'_> {
        DomApp::new(self.session.channel_mut())
    }
}
