//! Production implementations over the hub driver's /dev and /proc trees.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use log::debug;

use crate::byte_channel::{ChannelProvider, RawDevice};
use crate::error::ChannelError;
use crate::hub::{CardInfo, HubControl, PairInfo};
use crate::{DomAddr, DomSlot};

const PROC_ROOT: &str = "/proc/driver/domhub";
const RESET_TOKEN: &str = "reset\n";

struct DevNode(File);

impl RawDevice for DevNode {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }
}

/// Opens `/dev/dhc…` nodes and drives the per-module proc control paths.
///
/// The driver is expected to be in non-blocking mode (see
/// [`ProcHub::set_blocking`]); reads and writes then fail with
/// `WouldBlock` instead of stalling.
#[derive(Clone, Debug, Default)]
pub struct DevProvider;

impl DevProvider {
    pub fn new() -> Self {
        Self
    }
}

fn write_control(path: &Path, token: &str) -> Result<(), ChannelError> {
    fs::write(path, token).map_err(|source| ChannelError::Control {
        path: path.display().to_string(),
        source,
    })
}

fn read_control(path: &Path) -> Result<String, ChannelError> {
    fs::read_to_string(path).map_err(|source| ChannelError::Control {
        path: path.display().to_string(),
        source,
    })
}

impl ChannelProvider for DevProvider {
    fn open(&self, addr: DomAddr) -> Result<Box<dyn RawDevice>, ChannelError> {
        let node = addr.dev_node();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&node)
            .map_err(|source| ChannelError::Open { addr, source })?;
        debug!("{addr}: opened {}", node.display());
        Ok(Box::new(DevNode(file)))
    }

    fn softboot(&self, addr: DomAddr) -> Result<(), ChannelError> {
        write_control(&addr.proc_dir(PROC_ROOT).join("softboot"), RESET_TOKEN)
    }

    fn comm_reset(&self, addr: DomAddr) -> Result<(), ChannelError> {
        write_control(
            &addr.proc_dir(PROC_ROOT).join("is-communicating"),
            RESET_TOKEN,
        )
    }

    fn comm_stats(&self, addr: DomAddr) -> Result<String, ChannelError> {
        read_control(&addr.proc_dir(PROC_ROOT).join("comstat"))
    }

    fn fpga_regs(&self, addr: DomAddr) -> Result<String, ChannelError> {
        read_control(&addr.card_dir(PROC_ROOT).join("fpga"))
    }
}

/// Hub control over the driver proc tree.
#[derive(Clone, Debug)]
pub struct ProcHub {
    root: String,
}

impl Default for ProcHub {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl ProcHub {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn numbered_entries(dir: &Path, prefix: &str) -> Result<Vec<u32>, ChannelError> {
        let mut ids = Vec::new();
        let entries = fs::read_dir(dir)
            .map_err(|e| ChannelError::Scan(format!("{}: {e}", dir.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| ChannelError::Scan(e.to_string()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Ok(id) = rest.parse::<u32>() {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn addr_dir(&self, addr: DomAddr) -> std::path::PathBuf {
        addr.proc_dir(&self.root)
    }

    fn pair_flag(&self, card: u32, pair: u32, file: &str) -> Result<bool, ChannelError> {
        let path = Path::new(&self.root)
            .join(format!("card{card}"))
            .join(format!("pair{pair}"))
            .join(file);
        // The driver phrases these as "... is not ..." when the answer is no.
        Ok(!read_control(&path)?.contains("not"))
    }
}

impl HubControl for ProcHub {
    fn scan(&self) -> Result<Vec<CardInfo>, ChannelError> {
        let root = Path::new(&self.root);
        let mut cards = Vec::new();
        for card in Self::numbered_entries(root, "card")? {
            let card_dir = root.join(format!("card{card}"));
            let mut pairs = Vec::new();
            for pair in Self::numbered_entries(&card_dir, "pair")? {
                pairs.push(PairInfo {
                    id: pair,
                    plugged: self.pair_flag(card, pair, "is-plugged")?,
                    powered: !read_control(
                        &card_dir.join(format!("pair{pair}")).join("pwr"),
                    )?
                    .contains("off"),
                });
            }
            cards.push(CardInfo { id: card, pairs });
        }
        Ok(cards)
    }

    fn communicating_doms(&self) -> Result<Vec<DomAddr>, ChannelError> {
        let mut doms = Vec::new();
        for card in self.scan()? {
            for pair in &card.pairs {
                if !(pair.plugged && pair.powered) {
                    continue;
                }
                for slot in [DomSlot::A, DomSlot::B] {
                    let addr = DomAddr::new(card.id, pair.id, slot);
                    let path = self.addr_dir(addr).join("is-communicating");
                    match fs::read_to_string(&path) {
                        Ok(text) if !text.contains("not") => doms.push(addr),
                        Ok(_) => {}
                        // A missing dom entry just means nothing is attached.
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(source) => {
                            return Err(ChannelError::Control {
                                path: path.display().to_string(),
                                source,
                            })
                        }
                    }
                }
            }
        }
        Ok(doms)
    }

    fn release(&self) -> Result<String, ChannelError> {
        let text = read_control(&Path::new(&self.root).join("revision"))?;
        Ok(text.trim().to_string())
    }

    fn dom_id(&self, addr: DomAddr) -> Result<Option<String>, ChannelError> {
        let text = read_control(&self.addr_dir(addr).join("id"))?;
        let id: String = text
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .take(12)
            .collect();
        Ok((id.len() == 12).then_some(id))
    }

    fn set_blocking(&self, blocking: bool) -> Result<(), ChannelError> {
        let token = if blocking { "1\n" } else { "0\n" };
        write_control(&Path::new(&self.root).join("blocking"), token)
    }

    fn power_on(&self, card: u32, pair: u32) -> Result<(), ChannelError> {
        let path = Path::new(&self.root)
            .join(format!("card{card}"))
            .join(format!("pair{pair}"))
            .join("pwr");
        write_control(&path, "on\n")
    }

    fn power_off(&self, card: u32, pair: u32) -> Result<(), ChannelError> {
        let path = Path::new(&self.root)
            .join(format!("card{card}"))
            .join(format!("pair{pair}"))
            .join("pwr");
        write_control(&path, "off\n")
    }
}
