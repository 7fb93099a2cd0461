//! Simple Domapp-mode queries.

use session::BootMode::Domapp;
use testkit::{TestCase, TestCtx, TestError, TestInfo, TestRecord};

/// Release string query; the version becomes the summary line.
#[derive(Default)]
pub struct GetDomappRelease {
    record: TestRecord,
}

impl GetDomappRelease {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for GetDomappRelease {
    fn info(&self) -> TestInfo {
        TestInfo::new("domapp-release", Domapp, Domapp)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let release = ctx.domapp().get_release()?;
        self.record.set_summary(release);
        self.record.pass();
        Ok(())
    }
}

/// Mainboard id query; the id becomes the summary line.
#[derive(Default)]
pub struct DomIdTest {
    record: TestRecord,
}

impl DomIdTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for DomIdTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("dom-id", Domapp, Domapp)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let id = ctx.domapp().get_mainboard_id()?;
        if id.is_empty() {
            self.record.fail("empty mainboard id");
        } else {
            self.record.set_summary(id);
            self.record.pass();
        }
        Ok(())
    }
}

/// Message-level echo round trip.
#[derive(Default)]
pub struct EchoMessageTest {
    record: TestRecord,
}

impl EchoMessageTest {
    pub fn new() -> Self {
        Self::default()
    }
}

const ECHO_PAYLOAD: &[u8] = b"\x00\x01\x02\x03 echo payload \xfc\xfd\xfe\xff";

impl TestCase for EchoMessageTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("echo-message", Domapp, Domapp)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let reply = ctx.domapp().echo(ECHO_PAYLOAD)?;
        if reply != ECHO_PAYLOAD {
            self.record.fail(format!(
                "echo mismatch: sent {} bytes, got {} back",
                ECHO_PAYLOAD.len(),
                reply.len()
            ));
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Flasher-board serial query. Joins the pool only with the flasher
/// opt-in and runs only when explicitly selected.
#[derive(Default)]
pub struct FlasherSerialTest {
    record: TestRecord,
}

impl FlasherSerialTest {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for FlasherSerialTest {
    fn info(&self) -> TestInfo {
        TestInfo::new("flasher-serial", Domapp, Domapp).flasher()
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let serial = ctx.domapp().get_fb_serial()?;
        if serial.is_empty() {
            self.record.fail("empty flasher board serial");
        } else {
            self.record.set_summary(serial);
            self.record.pass();
        }
        Ok(())
    }
}
