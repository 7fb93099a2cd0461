use std::fmt;

/// The module's boot mode.
///
/// Exactly one mode holds at any instant per channel, as observed by the
/// last successful prompt check; the harness never tracks mode changes
/// transparently. `Unknown` is the honest answer before the first check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BootMode {
    /// Bootloader shell, prompt ends in `>`.
    Iceboot,
    /// Application runtime; only mode in which framed messaging is valid.
    Domapp,
    /// Configuration bootstrap, prompt ends in `#`.
    Configboot,
    /// Byte-echo diagnostic mode.
    EchoMode,
    Unknown,
}

impl BootMode {
    /// Short tag used in per-test console lines.
    pub fn tag(self) -> &'static str {
        match self {
            BootMode::Iceboot => "ib",
            BootMode::Domapp => "da",
            BootMode::Configboot => "cb",
            BootMode::EchoMode => "em",
            BootMode::Unknown => "??",
        }
    }
}

impl fmt::Display for BootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
