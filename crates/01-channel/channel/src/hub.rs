use crate::error::ChannelError;
use crate::DomAddr;

/// One wire pair on a card, as reported by the hub driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairInfo {
    pub id: u32,
    pub plugged: bool,
    pub powered: bool,
}

/// One hub card and its wire pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardInfo {
    pub id: u32,
    pub pairs: Vec<PairInfo>,
}

/// Hub-wide control surface: enumeration, power relays, driver knobs.
///
/// Power flips are the only mutating operations and are reached solely by
/// the power-cycle test through the orchestrator's pairwise rendezvous.
pub trait HubControl: Send + Sync {
    /// Discovers the hierarchy of cards and wire pairs.
    fn scan(&self) -> Result<Vec<CardInfo>, ChannelError>;

    /// Addresses of all modules currently communicating, in stable order.
    fn communicating_doms(&self) -> Result<Vec<DomAddr>, ChannelError>;

    /// Driver release string, for the run banner.
    fn release(&self) -> Result<String, ChannelError>;

    /// Hardware module id for `addr`, if the driver can read one.
    fn dom_id(&self, addr: DomAddr) -> Result<Option<String>, ChannelError>;

    /// Switches the whole hub between blocking and non-blocking reads.
    /// This harness always runs non-blocking.
    fn set_blocking(&self, blocking: bool) -> Result<(), ChannelError>;

    /// Powers one wire pair's relay on.
    fn power_on(&self, card: u32, pair: u32) -> Result<(), ChannelError>;

    /// Powers one wire pair's relay off. Both modules on the pair lose
    /// power together.
    fn power_off(&self, card: u32, pair: u32) -> Result<(), ChannelError>;
}
