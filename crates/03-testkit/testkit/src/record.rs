/// Pass/fail classification of one test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Mutable result state owned by each test instance.
///
/// The first `fail` fixes both the verdict and the summary; subsequent
/// failures append to the diagnostic log without overwriting the summary,
/// so the reported one-liner always names the original cause.
#[derive(Clone, Debug, Default)]
pub struct TestRecord {
    verdict: Option<Verdict>,
    summary: String,
    log: Vec<String>,
}

impl TestRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears verdict, summary, and log before a (re)run.
    pub fn reset(&mut self) {
        self.verdict = None;
        self.summary.clear();
        self.log.clear();
    }

    /// Marks the test passed unless it already failed.
    pub fn pass(&mut self) {
        if self.verdict.is_none() {
            self.verdict = Some(Verdict::Pass);
        }
    }

    /// Records a failure. Fixes the summary to the first failure only.
    pub fn fail(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.verdict != Some(Verdict::Fail) {
            self.verdict = Some(Verdict::Fail);
            self.summary = msg.clone();
        }
        self.log.push(msg);
    }

    /// Appends a diagnostic line without touching the verdict.
    pub fn note(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if !msg.is_empty() {
            self.log.push(msg);
        }
    }

    /// Sets the summary line for a passing test (release string, id, …).
    /// Ignored once a failure has fixed the summary.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        if self.verdict != Some(Verdict::Fail) {
            self.summary = summary.into();
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    pub fn failed(&self) -> bool {
        self.verdict == Some(Verdict::Fail)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The ordered diagnostic log as one printable block.
    pub fn debug_text(&self) -> String {
        let mut out = String::new();
        for line in &self.log {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_fixes_the_summary() {
        let mut rec = TestRecord::new();
        rec.fail("first cause");
        rec.fail("second cause");
        assert_eq!(rec.verdict(), Some(Verdict::Fail));
        assert_eq!(rec.summary(), "first cause");
        assert!(rec.debug_text().contains("second cause"));
    }

    #[test]
    fn pass_never_overrides_fail() {
        let mut rec = TestRecord::new();
        rec.fail("broken");
        rec.pass();
        assert_eq!(rec.verdict(), Some(Verdict::Fail));
    }

    #[test]
    fn reset_clears_everything() {
        let mut rec = TestRecord::new();
        rec.fail("broken");
        rec.reset();
        assert_eq!(rec.verdict(), None);
        assert_eq!(rec.summary(), "");
        assert!(rec.debug_text().is_empty());
    }

    #[test]
    fn summary_for_passing_test_is_kept() {
        let mut rec = TestRecord::new();
        rec.set_summary("V99-01");
        rec.pass();
        assert_eq!(rec.summary(), "V99-01");
    }
}
