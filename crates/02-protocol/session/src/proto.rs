use std::thread;
use std::time::Duration;

use log::{debug, trace};

use channel::{ByteChannel, ChannelError, PollTimer};

use crate::error::SessionError;

/// Prompt-check timeout.
const CHECK_TIMEOUT: Duration = Duration::from_secs(3);
/// Boot-mode transition timeout.
const TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);
/// Delay after entering Domapp before the runtime accepts messages.
pub const DOMAPP_SETTLE: Duration = Duration::from_secs(3);

/// Sleep between read polls while waiting for a prompt.
const EXPECT_POLL: Duration = Duration::from_millis(10);

/// Result of a named transition or prompt check.
///
/// Transitions never throw for "the module did not answer as expected";
/// they fold the evidence into `diagnostic` and let the caller decide
/// pass/fail. Channel-level I/O errors still surface as `Err`.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub ok: bool,
    pub diagnostic: String,
}

impl Outcome {
    fn pass() -> Self {
        Self {
            ok: true,
            diagnostic: String::new(),
        }
    }
}

/// Send-and-expect session over one exclusively owned byte channel.
pub struct Session {
    chan: ByteChannel,
    settle: Duration,
}

impl Session {
    pub fn new(chan: ByteChannel) -> Self {
        Self {
            chan,
            settle: DOMAPP_SETTLE,
        }
    }

    /// Overrides the post-Domapp settle delay. Emulated modules need none.
    pub fn set_settle(&mut self, settle: Duration) {
        self.settle = settle;
    }

    pub fn channel(&self) -> &ByteChannel {
        &self.chan
    }

    pub fn channel_mut(&mut self) -> &mut ByteChannel {
        &mut self.chan
    }

    pub fn into_channel(self) -> ByteChannel {
        self.chan
    }

    /// Writes `send`, then polls reads until `expect` occurs in the
    /// accumulated text or `timeout` elapses.
    ///
    /// `expect` is a literal substring: every prompt in the protocol is a
    /// fixed literal, and substring search keeps this loop simple.
    /// Returns the full captured text on success.
    pub fn send_and_expect(
        &mut self,
        send: &[u8],
        expect: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        self.chan.write_all(send, timeout)?;

        let timer = PollTimer::new(timeout);
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let got = self.chan.read_burst(&mut buf)?;
            let text = String::from_utf8_lossy(&buf);
            if text.contains(expect) {
                trace!("{}: matched \"{expect}\"", self.chan.addr());
                return Ok(text.into_owned());
            }
            if timer.expired() {
                return Err(SessionError::PatternNotFound {
                    expect: expect.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                    partial: buf,
                });
            }
            if got == 0 {
                timer.sleep(EXPECT_POLL);
            }
        }
    }

    /// Is the module at the Iceboot prompt right now?
    pub fn is_in_iceboot(&mut self) -> Result<Outcome, ChannelError> {
        self.transition(b"\r\n", ">", CHECK_TIMEOUT)
    }

    /// Is the module at the Configboot prompt right now?
    pub fn is_in_configboot(&mut self) -> Result<Outcome, ChannelError> {
        self.transition(b"\r\n", "#", CHECK_TIMEOUT)
    }

    pub fn configboot_to_iceboot(&mut self) -> Result<Outcome, ChannelError> {
        self.transition(b"r", ">", TRANSITION_TIMEOUT)
    }

    pub fn iceboot_to_configboot(&mut self) -> Result<Outcome, ChannelError> {
        self.transition(b"boot-serial reboot\r\n", "#", TRANSITION_TIMEOUT)
    }

    /// Boots the application runtime, then waits out the settle delay
    /// before the first message may be sent.
    pub fn iceboot_to_domapp(&mut self) -> Result<Outcome, ChannelError> {
        let outcome = self.transition(b"domapp\r\n", "domapp", TRANSITION_TIMEOUT)?;
        if outcome.ok && !self.settle.is_zero() {
            debug!("{}: domapp settle {:?}", self.chan.addr(), self.settle);
            thread::sleep(self.settle);
        }
        Ok(outcome)
    }

    pub fn iceboot_to_echo(&mut self) -> Result<Outcome, ChannelError> {
        self.transition(b"echo-mode\r\n", "echo-mode", TRANSITION_TIMEOUT)
    }

    /// Resets the module through the out-of-band control path. Lands it in
    /// Iceboot; the byte channel must be reopened afterwards.
    pub fn softboot(&mut self) -> Result<(), ChannelError> {
        self.chan.softboot()
    }

    /// Pulses the is-communicating control path.
    pub fn comm_reset(&mut self) -> Result<(), ChannelError> {
        self.chan.comm_reset()
    }

    fn transition(
        &mut self,
        send: &[u8],
        expect: &str,
        timeout: Duration,
    ) -> Result<Outcome, ChannelError> {
        match self.send_and_expect(send, expect, timeout) {
            Ok(_) => Ok(Outcome::pass()),
            Err(err @ SessionError::PatternNotFound { .. }) => Ok(Outcome {
                ok: false,
                diagnostic: err.to_string(),
            }),
            Err(SessionError::Channel(e)) => Err(e),
        }
    }
}
