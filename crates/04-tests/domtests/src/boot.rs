//! Boot-mode transitions and prompt checks.

use session::BootMode::{Configboot, Domapp, EchoMode, Iceboot};
use testkit::{TestCase, TestCtx, TestError, TestInfo, TestRecord};

/// Iceboot → Configboot, verified by the `#` prompt.
#[derive(Default)]
pub struct IcebootToConfigboot {
    record: TestRecord,
}

impl IcebootToConfigboot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for IcebootToConfigboot {
    fn info(&self) -> TestInfo {
        TestInfo::new("iceboot-to-configboot", Iceboot, Configboot)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let outcome = ctx.session.iceboot_to_configboot()?;
        if !outcome.ok {
            self.record.fail("could not transition into configboot");
            self.record.note(outcome.diagnostic);
            return Ok(());
        }
        let check = ctx.session.is_in_configboot()?;
        if !check.ok {
            self.record.fail("check for configboot prompt failed");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Configboot prompt check, state-preserving.
#[derive(Default)]
pub struct CheckConfigboot {
    record: TestRecord,
}

impl CheckConfigboot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for CheckConfigboot {
    fn info(&self) -> TestInfo {
        TestInfo::new("check-configboot", Configboot, Configboot)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let check = ctx.session.is_in_configboot()?;
        if !check.ok {
            self.record.fail("check for configboot prompt failed");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Configboot → Iceboot, verified by the `>` prompt.
#[derive(Default)]
pub struct ConfigbootToIceboot {
    record: TestRecord,
}

impl ConfigbootToIceboot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for ConfigbootToIceboot {
    fn info(&self) -> TestInfo {
        TestInfo::new("configboot-to-iceboot", Configboot, Iceboot)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let outcome = ctx.session.configboot_to_iceboot()?;
        if !outcome.ok {
            self.record.fail("could not transition into iceboot");
            self.record.note(outcome.diagnostic);
            return Ok(());
        }
        let check = ctx.session.is_in_iceboot()?;
        if !check.ok {
            self.record.fail("check for iceboot prompt failed");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Iceboot prompt check, state-preserving.
#[derive(Default)]
pub struct CheckIceboot {
    record: TestRecord,
}

impl CheckIceboot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for CheckIceboot {
    fn info(&self) -> TestInfo {
        TestInfo::new("check-iceboot", Iceboot, Iceboot)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let check = ctx.session.is_in_iceboot()?;
        if !check.ok {
            self.record.fail("check for iceboot prompt failed");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Iceboot → EchoMode.
#[derive(Default)]
pub struct IcebootToEcho {
    record: TestRecord,
}

impl IcebootToEcho {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for IcebootToEcho {
    fn info(&self) -> TestInfo {
        TestInfo::new("iceboot-to-echo", Iceboot, EchoMode)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let outcome = ctx.session.iceboot_to_echo()?;
        if !outcome.ok {
            self.record.fail("could not transition into echo mode");
            self.record.note(outcome.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// EchoMode → Iceboot via softboot, verified by the `>` prompt.
#[derive(Default)]
pub struct EchoToIceboot {
    record: TestRecord,
}

impl EchoToIceboot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for EchoToIceboot {
    fn info(&self) -> TestInfo {
        TestInfo::new("echo-to-iceboot", EchoMode, Iceboot)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        ctx.session.softboot()?;
        let check = ctx.session.is_in_iceboot()?;
        if !check.ok {
            self.record.fail("check for iceboot prompt failed");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Iceboot → Domapp; the session waits out the runtime settle delay.
#[derive(Default)]
pub struct IcebootToDomapp {
    record: TestRecord,
}

impl IcebootToDomapp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for IcebootToDomapp {
    fn info(&self) -> TestInfo {
        TestInfo::new("iceboot-to-domapp", Iceboot, Domapp)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        let outcome = ctx.session.iceboot_to_domapp()?;
        if !outcome.ok {
            self.record.fail("could not transition into domapp");
            self.record.note(outcome.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}

/// Domapp → Iceboot via softboot, verified by the `>` prompt.
#[derive(Default)]
pub struct DomappToIceboot {
    record: TestRecord,
}

impl DomappToIceboot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TestCase for DomappToIceboot {
    fn info(&self) -> TestInfo {
        TestInfo::new("domapp-to-iceboot", Domapp, Iceboot)
    }

    fn record(&self) -> &TestRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TestRecord {
        &mut self.record
    }

    fn run(&mut self, ctx: &mut TestCtx<'_>) -> Result<(), TestError> {
        ctx.session.softboot()?;
        let check = ctx.session.is_in_iceboot()?;
        if !check.ok {
            self.record.fail("check for iceboot prompt failed");
            self.record.note(check.diagnostic);
        } else {
            self.record.pass();
        }
        Ok(())
    }
}
