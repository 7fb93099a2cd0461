use thiserror::Error;

use channel::ChannelError;

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Messaging failures.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The module answered with a non-success status. The header bytes are
    /// the module's diagnostic.
    #[error("message status 0x{:02x} (header {})", .header[7], hex(.header))]
    Status { header: [u8; 8] },

    /// Fewer than the 8 header bytes (or fewer than the declared payload
    /// bytes) arrived before the timeout. The partial bytes are
    /// retrievable for diagnosis.
    #[error("truncated response: {} of {wanted} bytes ({})", .partial.len(), hex(.partial))]
    Truncated { wanted: usize, partial: Vec<u8> },

    /// A test without HV capability asked for a non-zero voltage. Always a
    /// programming error in a test definition; fails fast.
    #[error("not authorized for HV: only HV-capable tests may raise voltage")]
    NotAuthorizedForHv,

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
