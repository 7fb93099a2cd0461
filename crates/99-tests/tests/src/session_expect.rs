//! Send-and-expect timing and boot-mode transitions.

use std::time::{Duration, Instant};

use session::SessionError;

use crate::support::{hub_with_one_dom, open_session};

/// An absent pattern fails within timeout + one poll interval and keeps
/// the partial buffer.
#[test]
fn absent_pattern_fails_within_the_deadline() {
    let (hub, addr) = hub_with_one_dom();
    let mut session = open_session(&hub, addr);

    let timeout = Duration::from_millis(200);
    let started = Instant::now();
    let err = session
        .send_and_expect(b"\r\n", "never-appears", timeout)
        .expect_err("pattern cannot match");
    let elapsed = started.elapsed();

    assert!(
        elapsed < timeout + Duration::from_millis(150),
        "took {elapsed:?}"
    );
    match err {
        SessionError::PatternNotFound { partial, .. } => {
            // The iceboot prompt did arrive; it just never matched.
            assert!(String::from_utf8_lossy(&partial).contains('>'));
        }
        other => panic!("expected PatternNotFound, got {other}"),
    }
}

/// The standard walk: Iceboot -> Configboot -> Iceboot -> EchoMode.
#[test]
fn boot_mode_walk_follows_the_prompts() {
    let (hub, addr) = hub_with_one_dom();
    let mut session = open_session(&hub, addr);

    assert!(session.is_in_iceboot().unwrap().ok);
    assert!(session.iceboot_to_configboot().unwrap().ok);
    assert!(session.is_in_configboot().unwrap().ok);
    // A configboot module does not show the iceboot prompt.
    assert!(!session.is_in_iceboot().unwrap().ok);
    assert!(session.configboot_to_iceboot().unwrap().ok);
    assert!(session.iceboot_to_echo().unwrap().ok);

    // Echo mode sends our bytes straight back.
    let echoed = session
        .send_and_expect(b"round-trip-packet", "round-trip-packet", Duration::from_secs(1))
        .expect("echo");
    assert!(echoed.contains("round-trip-packet"));
}

/// Softboot lands the module back in Iceboot from any mode.
#[test]
fn softboot_recovers_to_iceboot() {
    let (hub, addr) = hub_with_one_dom();
    let mut session = open_session(&hub, addr);

    assert!(session.iceboot_to_echo().unwrap().ok);
    session.softboot().expect("softboot");
    session.channel_mut().reopen().expect("reopen");
    assert!(session.is_in_iceboot().unwrap().ok);
}

/// Failed transitions report a diagnostic instead of raising.
#[test]
fn failed_transition_folds_into_the_outcome() {
    let (hub, addr) = hub_with_one_dom();
    let mut session = open_session(&hub, addr);

    // In iceboot, asking for the configboot prompt cannot succeed.
    let outcome = session.is_in_configboot().expect("channel stays healthy");
    assert!(!outcome.ok);
    assert!(outcome.diagnostic.contains("did not arrive"));
}
