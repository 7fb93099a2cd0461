//! Message protocol behavior against the emulated module.

use std::time::Duration;

use message::ops::{data, facility, msghand};
use message::{DomApp, MessageError, MoniKind};
use mockdom::{ascii_moni_record, MockResponse};

use crate::support::{hub_with_one_dom, session_in_domapp};

/// A well-formed success response returns exactly the payload bytes.
#[test]
fn success_response_returns_exact_payload() {
    let (hub, addr) = hub_with_one_dom();
    let payload: Vec<u8> = (0..12u8).collect();
    hub.script(
        addr,
        facility::MESSAGE_HANDLER,
        msghand::GET_DOMAPP_RELEASE,
        MockResponse::Payload(payload.clone()),
    );

    let mut session = session_in_domapp(&hub, addr);
    let mut da = DomApp::new(session.channel_mut());
    let got = da
        .request(facility::MESSAGE_HANDLER, msghand::GET_DOMAPP_RELEASE, &[])
        .expect("scripted success");
    assert_eq!(got, payload);
}

/// A non-success status always raises and never yields a payload.
#[test]
fn non_success_status_is_a_messaging_error() {
    let (hub, addr) = hub_with_one_dom();
    hub.script(
        addr,
        facility::MESSAGE_HANDLER,
        msghand::GET_DOM_ID,
        MockResponse::Status(0xC8),
    );

    let mut session = session_in_domapp(&hub, addr);
    let mut da = DomApp::new(session.channel_mut());
    let err = da.get_mainboard_id().expect_err("status must fail");
    match err {
        MessageError::Status { header } => assert_eq!(header[7], 0xC8),
        other => panic!("expected Status error, got {other}"),
    }
}

/// A 5-byte header fragment before timeout raises with those bytes
/// retrievable.
#[test]
fn truncated_header_keeps_partial_bytes() {
    let (hub, addr) = hub_with_one_dom();
    let fragment = vec![1, 24, 0, 0, 0];
    hub.script(
        addr,
        facility::MESSAGE_HANDLER,
        msghand::GET_DOMAPP_RELEASE,
        MockResponse::Truncate(fragment.clone()),
    );

    let mut session = session_in_domapp(&hub, addr);
    let mut da = DomApp::new(session.channel_mut());
    da.set_timeout(Duration::from_millis(100));
    let err = da.get_release().expect_err("truncation must fail");
    match err {
        MessageError::Truncated { wanted, partial } => {
            assert_eq!(wanted, 8);
            assert_eq!(partial, fragment);
        }
        other => panic!("expected Truncated error, got {other}"),
    }
}

/// HV gating: a missing token refuses non-zero voltage before any bytes
/// hit the wire; zero voltage needs no token.
#[test]
fn hv_capability_is_enforced_at_the_call_site() {
    let (hub, addr) = hub_with_one_dom();
    let mut session = session_in_domapp(&hub, addr);
    let mut da = DomApp::new(session.channel_mut());

    assert!(matches!(
        da.set_hv(None, 1600),
        Err(MessageError::NotAuthorizedForHv)
    ));
    assert!(matches!(
        da.enable_hv(None),
        Err(MessageError::NotAuthorizedForHv)
    ));
    da.set_hv(None, 0).expect("voltage-off needs no grant");

    let token = message::HvToken::grant();
    da.enable_hv(Some(&token)).expect("granted enable");
    da.set_hv(Some(&token), 1600).expect("granted ramp");
    let (adc, dac) = da.query_hv().expect("readback");
    assert_eq!((adc, dac), (1600, 1600));
}

/// Monitoring drains run to the empty response, not a single pull.
#[test]
fn drain_moni_collects_until_empty() {
    let (hub, addr) = hub_with_one_dom();
    hub.push_moni(addr, ascii_moni_record(0x2000, "first"));
    hub.push_moni(addr, ascii_moni_record(0x3000, "second"));

    let mut session = session_in_domapp(&hub, addr);
    let mut da = DomApp::new(session.channel_mut());
    let records = da.drain_moni().expect("drain");
    let texts: Vec<_> = records
        .iter()
        .filter_map(|r| match &r.kind {
            MoniKind::Ascii(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    // The emulator seeds one banner record at construction.
    assert!(texts.contains(&"first") && texts.contains(&"second"));

    let again = da.drain_moni().expect("drain empty");
    assert!(again.is_empty());

    // And the raw pull now reports an empty buffer.
    let raw = da
        .request(facility::DATA_ACCESS, data::GET_NEXT_MONI_REC, &[])
        .expect("empty pull");
    assert!(raw.is_empty());
}
