use std::collections::{HashMap, VecDeque};

use message::{MessageHeader, HEADER_LEN, STATUS_SUCCESS};

/// Boot mode of an emulated module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MockMode {
    Iceboot,
    Configboot,
    Domapp,
    Echo,
}

/// Scripted override for one (facility, subtype).
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Respond success with this payload.
    Payload(Vec<u8>),
    /// Respond with this status byte and no payload.
    Status(u8),
    /// Emit exactly these raw bytes and nothing more, ever.
    Truncate(Vec<u8>),
}

/// Builds a well-framed ASCII monitoring record.
pub fn ascii_moni_record(clock: u64, text: &str) -> Vec<u8> {
    let len = (10 + text.len()) as u16;
    let mut rec = Vec::with_capacity(len as usize);
    rec.extend_from_slice(&len.to_be_bytes());
    rec.extend_from_slice(&0xCBu16.to_be_bytes());
    rec.extend_from_slice(&clock.to_be_bytes()[2..]);
    rec.extend_from_slice(text.as_bytes());
    rec
}

const SN_BINS_PER_PULL: usize = 16;
const SN_BIN_TICKS: u64 = 65536;
const WAVEFORM_BUFFERS_PER_RUN: u32 = 3;

/// One emulated module's full state.
pub(crate) struct DomState {
    pub mode: MockMode,
    pub powered: bool,
    inbox: Vec<u8>,
    outbox: VecDeque<u8>,
    pub release: String,
    pub mainboard_id: String,
    fb_serial: String,
    hv_enabled: bool,
    hv_dac: u16,
    run_active: bool,
    sn_clock: u64,
    wf_remaining: u32,
    moni_queue: VecDeque<Vec<u8>>,
    overrides: HashMap<(u8, u8), MockResponse>,
}

impl DomState {
    pub fn new(mainboard_id: String) -> Self {
        let mut moni_queue = VecDeque::new();
        moni_queue.push_back(ascii_moni_record(0x1000, "mock module alive"));
        Self {
            mode: MockMode::Iceboot,
            powered: true,
            inbox: Vec::new(),
            outbox: VecDeque::new(),
            release: "VMock-05-01".to_string(),
            mainboard_id,
            fb_serial: "fb-mock-0001".to_string(),
            hv_enabled: false,
            hv_dac: 0,
            run_active: false,
            sn_clock: 0x4000_0000,
            wf_remaining: 0,
            moni_queue,
            overrides: HashMap::new(),
        }
    }

    pub fn script(&mut self, facility: u8, subtype: u8, response: MockResponse) {
        self.overrides.insert((facility, subtype), response);
    }

    pub fn push_moni(&mut self, record: Vec<u8>) {
        self.moni_queue.push_back(record);
    }

    /// Full reset, as after a softboot or a power cycle.
    pub fn reboot(&mut self) {
        self.mode = MockMode::Iceboot;
        self.inbox.clear();
        self.outbox.clear();
        self.hv_enabled = false;
        self.hv_dac = 0;
        self.run_active = false;
    }

    pub fn read_out(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.outbox.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.outbox.pop_front().unwrap_or_default();
        }
        n
    }

    pub fn has_output(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn accept(&mut self, bytes: &[u8]) {
        match self.mode {
            MockMode::Echo => self.outbox.extend(bytes.iter().copied()),
            MockMode::Iceboot => {
                self.inbox.extend_from_slice(bytes);
                self.step_iceboot();
            }
            MockMode::Configboot => {
                self.inbox.extend_from_slice(bytes);
                self.step_configboot();
            }
            MockMode::Domapp => {
                self.inbox.extend_from_slice(bytes);
                self.step_domapp();
            }
        }
    }

    fn respond(&mut self, text: &str) {
        self.outbox.extend(text.as_bytes().iter().copied());
    }

    fn step_iceboot(&mut self) {
        let text = String::from_utf8_lossy(&self.inbox).into_owned();
        if text.contains("boot-serial reboot\r\n") {
            self.inbox.clear();
            self.mode = MockMode::Configboot;
            self.respond("\r\n# ");
        } else if text.contains("echo-mode\r\n") {
            self.inbox.clear();
            self.mode = MockMode::Echo;
            self.respond("echo-mode\r\n");
        } else if text.contains("domapp\r\n") {
            self.inbox.clear();
            self.mode = MockMode::Domapp;
            self.respond("domapp\r\n");
        } else if text.contains("\r\n") {
            self.inbox.clear();
            self.respond("\r\n> ");
        }
    }

    fn step_configboot(&mut self) {
        if self.inbox.contains(&b'r') {
            self.inbox.clear();
            self.mode = MockMode::Iceboot;
            self.respond("\r\n> ");
        } else if self.inbox.windows(2).any(|w| w == b"\r\n") {
            self.inbox.clear();
            self.respond("\r\n# ");
        }
    }

    fn step_domapp(&mut self) {
        while self.inbox.len() >= HEADER_LEN {
            let mut head = [0u8; HEADER_LEN];
            head.copy_from_slice(&self.inbox[..HEADER_LEN]);
            let header = MessageHeader::decode(&head);
            let total = HEADER_LEN + header.length as usize;
            if self.inbox.len() < total {
                return;
            }
            let payload: Vec<u8> = self.inbox[HEADER_LEN..total].to_vec();
            self.inbox.drain(..total);
            self.handle_request(header, &payload);
        }
    }

    fn reply(&mut self, request: MessageHeader, status: u8, payload: &[u8]) {
        let header = MessageHeader {
            mtype: request.mtype,
            subtype: request.subtype,
            length: payload.len() as u16,
            reserved: 0,
            id: request.id,
            status,
        };
        self.outbox.extend(header.encode());
        self.outbox.extend(payload.iter().copied());
    }

    fn handle_request(&mut self, header: MessageHeader, payload: &[u8]) {
        if let Some(scripted) = self.overrides.get(&(header.mtype, header.subtype)).cloned() {
            match scripted {
                MockResponse::Payload(bytes) => self.reply(header, STATUS_SUCCESS, &bytes),
                MockResponse::Status(status) => self.reply(header, status, &[]),
                MockResponse::Truncate(bytes) => self.outbox.extend(bytes.iter().copied()),
            }
            return;
        }

        use message::ops::{data, expctl, facility, msghand, slow};
        let response: Vec<u8> = match (header.mtype, header.subtype) {
            (facility::MESSAGE_HANDLER, msghand::GET_DOM_ID) => {
                self.mainboard_id.clone().into_bytes()
            }
            (facility::MESSAGE_HANDLER, msghand::GET_DOMAPP_RELEASE) => {
                self.release.clone().into_bytes()
            }
            (facility::MESSAGE_HANDLER, msghand::ECHO_MSG) => payload.to_vec(),
            (facility::DATA_ACCESS, data::GET_FB_SERIAL) => self.fb_serial.clone().into_bytes(),
            (facility::SLOW_CONTROL, slow::ENABLE_PMT_HV) => {
                self.hv_enabled = true;
                Vec::new()
            }
            (facility::SLOW_CONTROL, slow::DISABLE_PMT_HV) => {
                self.hv_enabled = false;
                self.hv_dac = 0;
                Vec::new()
            }
            (facility::SLOW_CONTROL, slow::SET_PMT_HV) => {
                if payload.len() >= 2 {
                    self.hv_dac = u16::from_be_bytes([payload[0], payload[1]]);
                }
                Vec::new()
            }
            (facility::SLOW_CONTROL, slow::QUERY_PMT_HV) => {
                // Perfect supply: the ADC reads back exactly the DAC
                // target while enabled, zero otherwise.
                let adc = if self.hv_enabled { self.hv_dac } else { 0 };
                let mut out = Vec::with_capacity(4);
                out.extend_from_slice(&adc.to_be_bytes());
                out.extend_from_slice(&self.hv_dac.to_be_bytes());
                out
            }
            (facility::DATA_ACCESS, data::GET_NEXT_MONI_REC) => {
                self.moni_queue.pop_front().unwrap_or_default()
            }
            (facility::DATA_ACCESS, data::GET_SN_DATA) => {
                if self.run_active {
                    let rec = self.next_sn_record();
                    self.sn_clock += (SN_BINS_PER_PULL as u64) * SN_BIN_TICKS;
                    rec
                } else {
                    Vec::new()
                }
            }
            (facility::DATA_ACCESS, data::GET_DATA) => {
                if self.run_active && self.wf_remaining > 0 {
                    self.wf_remaining -= 1;
                    vec![0xAB; 64]
                } else {
                    Vec::new()
                }
            }
            (facility::EXPERIMENT_CONTROL, expctl::BEGIN_RUN) => {
                self.run_active = true;
                self.wf_remaining = WAVEFORM_BUFFERS_PER_RUN;
                Vec::new()
            }
            (facility::EXPERIMENT_CONTROL, expctl::END_RUN) => {
                self.run_active = false;
                Vec::new()
            }
            // Configuration writes are accepted silently.
            _ => Vec::new(),
        };
        self.reply(header, STATUS_SUCCESS, &response);
    }

    fn next_sn_record(&self) -> Vec<u8> {
        let mut rec = Vec::with_capacity(10 + SN_BINS_PER_PULL);
        rec.extend_from_slice(&((10 + SN_BINS_PER_PULL) as u16).to_be_bytes());
        rec.extend_from_slice(&300u16.to_be_bytes());
        rec.extend_from_slice(&self.sn_clock.to_be_bytes()[2..]);
        rec.extend(std::iter::repeat(1u8).take(SN_BINS_PER_PULL));
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iceboot_prompt_and_domapp_entry() {
        let mut dom = DomState::new("0123456789ab".to_string());
        dom.accept(b"\r\n");
        let mut buf = [0u8; 16];
        let n = dom.read_out(&mut buf);
        assert!(String::from_utf8_lossy(&buf[..n]).contains('>'));

        dom.accept(b"domapp\r\n");
        let n = dom.read_out(&mut buf);
        assert!(String::from_utf8_lossy(&buf[..n]).contains("domapp"));
        assert_eq!(dom.mode, MockMode::Domapp);
    }

    #[test]
    fn domapp_echo_round_trip() {
        let mut dom = DomState::new("0123456789ab".to_string());
        dom.mode = MockMode::Domapp;
        let header = MessageHeader::request(1, 18, 3, 9);
        let mut msg = header.encode().to_vec();
        msg.extend_from_slice(b"abc");
        dom.accept(&msg);

        let mut buf = [0u8; 32];
        let n = dom.read_out(&mut buf);
        assert_eq!(n, HEADER_LEN + 3);
        let mut head = [0u8; HEADER_LEN];
        head.copy_from_slice(&buf[..HEADER_LEN]);
        let resp = MessageHeader::decode(&head);
        assert_eq!(resp.id, 9);
        assert_eq!(resp.status, STATUS_SUCCESS);
        assert_eq!(&buf[HEADER_LEN..n], b"abc");
    }

    #[test]
    fn sn_records_are_clock_continuous() {
        let mut dom = DomState::new("0123456789ab".to_string());
        dom.mode = MockMode::Domapp;
        dom.run_active = true;
        let first = dom.next_sn_record();
        let clock0 = first[4..10]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        dom.sn_clock += (SN_BINS_PER_PULL as u64) * SN_BIN_TICKS;
        let second = dom.next_sn_record();
        let clock1 = second[4..10]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        assert_eq!(clock1, clock0 + (SN_BINS_PER_PULL as u64) * SN_BIN_TICKS);
    }
}
