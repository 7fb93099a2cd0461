use std::fmt;
use std::path::PathBuf;

/// Which of the two modules on a wire pair this address names.
///
/// The two slots of one (card, pair) share a physical wire and a single
/// power relay, which is why power cycling must be coordinated pairwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DomSlot {
    A,
    B,
}

impl DomSlot {
    /// Returns the opposite slot on the same wire pair.
    pub fn other(self) -> Self {
        match self {
            DomSlot::A => DomSlot::B,
            DomSlot::B => DomSlot::A,
        }
    }

    /// Single-letter form used in device node and proc path names.
    pub fn letter(self) -> char {
        match self {
            DomSlot::A => 'A',
            DomSlot::B => 'B',
        }
    }

    /// Parses `'A'`/`'a'`/`'B'`/`'b'`.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' | 'a' => Some(DomSlot::A),
            'B' | 'b' => Some(DomSlot::B),
            _ => None,
        }
    }
}

/// Physical address of one module: (card, pair, slot).
///
/// Immutable for the process lifetime. All device node and proc tree path
/// derivations live here so the rest of the workspace never concatenates
/// path strings itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomAddr {
    pub card: u32,
    pub pair: u32,
    pub slot: DomSlot,
}

impl DomAddr {
    pub fn new(card: u32, pair: u32, slot: DomSlot) -> Self {
        Self { card, pair, slot }
    }

    /// The address of the module sharing this wire pair.
    pub fn partner(self) -> Self {
        Self {
            slot: self.slot.other(),
            ..self
        }
    }

    /// Key identifying the shared wire pair (and its power relay).
    pub fn pair_key(self) -> (u32, u32) {
        (self.card, self.pair)
    }

    /// `/dev/dhc<card>w<pair>d<slot>` — the read/write device node.
    pub fn dev_node(self) -> PathBuf {
        PathBuf::from(format!(
            "/dev/dhc{}w{}d{}",
            self.card,
            self.pair,
            self.slot.letter()
        ))
    }

    /// Proc directory for this module under the hub driver tree.
    pub fn proc_dir(self, root: &str) -> PathBuf {
        PathBuf::from(root)
            .join(format!("card{}", self.card))
            .join(format!("pair{}", self.pair))
            .join(format!("dom{}", self.slot.letter()))
    }

    /// Proc directory for this module's card.
    pub fn card_dir(self, root: &str) -> PathBuf {
        PathBuf::from(root).join(format!("card{}", self.card))
    }

    /// Proc directory for this module's wire pair.
    pub fn pair_dir(self, root: &str) -> PathBuf {
        PathBuf::from(root)
            .join(format!("card{}", self.card))
            .join(format!("pair{}", self.pair))
    }
}

impl fmt::Display for DomAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.card, self.pair, self.slot.letter())
    }
}
