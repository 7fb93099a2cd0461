use thiserror::Error;

use crate::DomAddr;

/// Channel-level failures.
///
/// These are always fatal to the in-progress test but never to the channel
/// itself: the next test may still attempt recovery via softboot.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("device I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("open {addr}: {source}")]
    Open {
        addr: DomAddr,
        source: std::io::Error,
    },

    #[error("write of {wanted} bytes stalled after {written} within {timeout_ms} ms")]
    WriteTimeout {
        wanted: usize,
        written: usize,
        timeout_ms: u64,
    },

    #[error("control path {path}: {source}")]
    Control {
        path: String,
        source: std::io::Error,
    },

    #[error("hub scan: {0}")]
    Scan(String),
}
