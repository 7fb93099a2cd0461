/// Capability token for high-voltage operations.
///
/// Granted by the orchestrator only to tests declared HV-capable; holding
/// one is what authorizes raising the PMT supply. Any test may request
/// voltage-off or disable without a token. Deliberately neither `Clone`
/// nor `Copy` so a grant cannot leak beyond the test it was issued to.
#[derive(Debug)]
pub struct HvToken(());

impl HvToken {
    /// Issues a token. Call sites are the orchestrator's pool setup and
    /// tests' own test code; concrete tests receive theirs via `TestCtx`.
    pub fn grant() -> Self {
        Self(())
    }
}
