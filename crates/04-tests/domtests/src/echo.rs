//! Byte-level echo-mode verification.

use std::time::Duration;

use session::BootMode::EchoMode;
use session::SessionError;
use testkit::{TestCase, TestCtx, TestError, TestInfo, TestRecord};

const PACKET: &[u8] = b"ECHO-0123456789-ABCDEF\r\n";
const EXPECT: &str = "ECHO-0123456789-ABCDEF";
const ECHO_TIMEOUT: Duration = Duration::from_secs(3);

/// Writes a fixed packet in echo mode and expects it back verbatim.
#[derive(Default)]
pub struct EchoPacketTest {
    record: TestRecord,
}

impl EchoPacketTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for EchoPacketTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("echo-packet", EchoMode, EchoMode)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        match ctx.session.send_and_expect(PACKET, EXPECT, ECHO_TIMEOUT) {
            Ok(_) => self.record.pass(),
            Err(err @ SessionError::PatternNotFound { .. }) => {
                self.record.fail("packet was not echoed back");
                self.record.note(err.to_string());
            }
            Err(SessionError::Channel(e)) => return Err(e.into()),
        }
        Ok(())
    }
}
