use thiserror::Error;

use channel::ChannelError;

/// Session-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The expected response never arrived within the timeout. Carries the
    /// partial buffer for diagnosis; callers must not assume the partial
    /// data is safe to re-parse.
    #[error("expected \"{expect}\" did not arrive within {timeout_ms} ms; got {} bytes: {}",
            .partial.len(), String::from_utf8_lossy(.partial))]
    PatternNotFound {
        expect: String,
        timeout_ms: u64,
        partial: Vec<u8>,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
