use thiserror::Error;

use channel::ChannelError;
use message::MessageError;
use session::SessionError;

/// Any error a test body can propagate with `?`.
///
/// These never escape the test boundary: the runner converts them to a
/// FAIL verdict plus diagnostic text.
#[derive(Debug, Error)]
pub enum TestError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("{0}")]
    Other(String),
}

impl TestError {
    pub fn other(msg: impl Into<String>) -> Self {
        TestError::Other(msg.into())
    }
}
