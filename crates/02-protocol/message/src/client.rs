use std::time::Duration;

use log::warn;

use channel::{ByteChannel, PollTimer};

use crate::codec::{MessageHeader, HEADER_LEN};
use crate::error::MessageError;
use crate::hv::HvToken;
use crate::moni::MoniRecord;
use crate::ops::{data, expctl, facility, msghand, slow};

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Pulser selection for heartbeat / electronic-pulse configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulserMode {
    /// Analog front-end pulser on, heartbeats off.
    FrontEnd,
    /// Heartbeat (beacon) pulser on, analog pulser off.
    Beacon,
}

/// Local-coincidence settings; `None` fields are left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct LcConfig {
    pub mode: Option<u8>,
    pub lc_type: Option<u8>,
    pub source: Option<u8>,
    pub transmit: Option<u8>,
    pub span: Option<u8>,
    pub window: Option<[i32; 4]>,
    pub cable_len: Option<[u16; 8]>,
}

/// Coded engineering readout format.
///
/// The runtime takes the ATWD readout request as a packed nibble code per
/// chip pair; only certain (word size, sample count) combinations exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngFormat {
    pub nfadc: u8,
    atwd01: u8,
    atwd23: u8,
}

impl EngFormat {
    /// Builds the coded form from per-channel word sizes (1 or 2 bytes)
    /// and sample counts (0/16/32/64/128). Returns `None` for a
    /// combination the hardware cannot express.
    pub fn coded(nfadc: u8, word_sizes: [u8; 4], counts: [u16; 4]) -> Option<Self> {
        let m0 = atwd_mask(word_sizes[0], counts[0])?;
        let m1 = atwd_mask(word_sizes[1], counts[1])?;
        let m2 = atwd_mask(word_sizes[2], counts[2])?;
        let m3 = atwd_mask(word_sizes[3], counts[3])?;
        Some(Self {
            nfadc,
            atwd01: m0 | (m1 << 4),
            atwd23: m2 | (m3 << 4),
        })
    }
}

fn atwd_mask(word_size: u8, count: u16) -> Option<u8> {
    match (word_size, count) {
        (1, 0) | (2, 0) => Some(0),
        (1, 16) => Some(9),
        (1, 32) => Some(1),
        (1, 64) => Some(5),
        (1, 128) => Some(13),
        (2, 16) => Some(11),
        (2, 32) => Some(3),
        (2, 64) => Some(7),
        (2, 128) => Some(15),
        _ => None,
    }
}

/// Typed client for the module application runtime.
///
/// Borrows the channel for the duration of a Domapp-mode conversation;
/// `&mut` access keeps the single-outstanding-request discipline honest.
pub struct DomApp<'a> {
    chan: &'a mut ByteChannel,
    timeout: Duration,
    next_id: u8,
}

impl<'a> DomApp<'a> {
    pub fn new(chan: &'a mut ByteChannel) -> Self {
        Self {
            chan,
            timeout: REQUEST_TIMEOUT,
            next_id: 0,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Sends one framed request and returns the response payload.
    ///
    /// Writes header + payload with retry-on-would-block, then reads until
    /// the 8 header bytes plus the declared payload length have arrived.
    /// Short arrivals are [`MessageError::Truncated`]; a non-success
    /// status is [`MessageError::Status`] and never yields a payload.
    pub fn request(
        &mut self,
        mtype: u8,
        subtype: u8,
        payload: &[u8],
    ) -> Result<Vec<u8>, MessageError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let header = MessageHeader::request(mtype, subtype, payload.len() as u16, id);
        let mut msg = Vec::with_capacity(HEADER_LEN + payload.len());
        msg.extend_from_slice(&header.encode());
        msg.extend_from_slice(payload);
        self.chan.write_all(&msg, self.timeout)?;

        let timer = PollTimer::new(self.timeout);
        let mut buf: Vec<u8> = Vec::new();
        if !self.chan.read_until(&mut buf, HEADER_LEN, &timer)? {
            return Err(MessageError::Truncated {
                wanted: HEADER_LEN,
                partial: buf,
            });
        }

        let mut head = [0u8; HEADER_LEN];
        head.copy_from_slice(&buf[..HEADER_LEN]);
        let resp = MessageHeader::decode(&head);

        let total = HEADER_LEN + resp.length as usize;
        if !self.chan.read_until(&mut buf, total, &timer)? {
            return Err(MessageError::Truncated {
                wanted: total,
                partial: buf,
            });
        }

        if !resp.is_success() {
            return Err(MessageError::Status { header: head });
        }
        if resp.id != id {
            warn!(
                "{}: response id {} for request id {}",
                self.chan.addr(),
                resp.id,
                id
            );
        }
        buf.drain(..HEADER_LEN);
        buf.truncate(resp.length as usize);
        Ok(buf)
    }

    // --- queries ---------------------------------------------------------

    pub fn get_mainboard_id(&mut self) -> Result<String, MessageError> {
        let raw = self.request(facility::MESSAGE_HANDLER, msghand::GET_DOM_ID, &[])?;
        Ok(String::from_utf8_lossy(&raw).trim().to_string())
    }

    pub fn get_release(&mut self) -> Result<String, MessageError> {
        let raw = self.request(facility::MESSAGE_HANDLER, msghand::GET_DOMAPP_RELEASE, &[])?;
        Ok(String::from_utf8_lossy(&raw).trim().to_string())
    }

    /// Message-level echo; the runtime returns the payload verbatim.
    pub fn echo(&mut self, payload: &[u8]) -> Result<Vec<u8>, MessageError> {
        self.request(facility::MESSAGE_HANDLER, msghand::ECHO_MSG, payload)
    }

    pub fn get_fb_serial(&mut self) -> Result<String, MessageError> {
        let raw = self.request(facility::DATA_ACCESS, data::GET_FB_SERIAL, &[])?;
        Ok(String::from_utf8_lossy(&raw).trim().to_string())
    }

    // --- configuration writes -------------------------------------------

    pub fn write_dac(&mut self, dac: u8, value: u16) -> Result<(), MessageError> {
        let v = value.to_be_bytes();
        self.request(
            facility::SLOW_CONTROL,
            slow::WRITE_ONE_DAC,
            &[dac, 0, v[0], v[1]],
        )?;
        Ok(())
    }

    /// Trigger modes: 0 test pattern, 1 forced, 2 discriminator, 3 flasher.
    pub fn set_trigger_mode(&mut self, mode: u8) -> Result<(), MessageError> {
        self.request(facility::SLOW_CONTROL, slow::SET_TRIG_MODE, &[mode])?;
        Ok(())
    }

    pub fn select_mux(&mut self, mux: u8) -> Result<(), MessageError> {
        self.request(facility::SLOW_CONTROL, slow::MUX_SELECT, &[mux])?;
        Ok(())
    }

    pub fn select_atwd(&mut self, atwd: u8) -> Result<(), MessageError> {
        self.request(facility::SLOW_CONTROL, slow::SELECT_ATWD, &[atwd])?;
        Ok(())
    }

    pub fn set_pulser(&mut self, mode: PulserMode, rate_hz: Option<u16>) -> Result<(), MessageError> {
        let subtype = match mode {
            PulserMode::FrontEnd => slow::SET_PULSER_ON,
            PulserMode::Beacon => slow::SET_PULSER_OFF,
        };
        self.request(facility::SLOW_CONTROL, subtype, &[])?;
        if let Some(rate) = rate_hz {
            self.request(
                facility::SLOW_CONTROL,
                slow::SET_PULSER_RATE,
                &rate.to_be_bytes(),
            )?;
        }
        Ok(())
    }

    pub fn set_lc(&mut self, lc: &LcConfig) -> Result<(), MessageError> {
        if let Some(mode) = lc.mode {
            self.request(facility::SLOW_CONTROL, slow::SET_LOCAL_COIN_MODE, &[mode])?;
        }
        if let Some(t) = lc.lc_type {
            self.request(facility::SLOW_CONTROL, slow::SET_LC_TYPE, &[t])?;
        }
        if let Some(src) = lc.source {
            self.request(facility::SLOW_CONTROL, slow::SET_LC_SRC, &[src])?;
        }
        if let Some(tx) = lc.transmit {
            self.request(facility::SLOW_CONTROL, slow::SET_LC_TX, &[tx])?;
        }
        if let Some(span) = lc.span {
            self.request(facility::SLOW_CONTROL, slow::SET_LC_SPAN, &[span])?;
        }
        if let Some(window) = lc.window {
            let mut payload = Vec::with_capacity(16);
            for w in window {
                payload.extend_from_slice(&w.to_be_bytes());
            }
            self.request(facility::SLOW_CONTROL, slow::SET_LOCAL_COIN_WINDOW, &payload)?;
        }
        if let Some(cables) = lc.cable_len {
            let mut payload = Vec::with_capacity(16);
            for c in cables {
                payload.extend_from_slice(&c.to_be_bytes());
            }
            self.request(facility::SLOW_CONTROL, slow::SET_LC_CABLE_LEN, &payload)?;
        }
        Ok(())
    }

    pub fn set_eng_format(&mut self, fmt: EngFormat) -> Result<(), MessageError> {
        self.request(
            facility::DATA_ACCESS,
            data::SET_ENG_FMT,
            &[fmt.nfadc, fmt.atwd01, fmt.atwd23],
        )?;
        Ok(())
    }

    /// Data formats: 0 engineering, 2 delta-compressed.
    pub fn set_data_format(&mut self, fmt: u8) -> Result<(), MessageError> {
        self.request(facility::DATA_ACCESS, data::SET_DATA_FORMAT, &[fmt])?;
        Ok(())
    }

    pub fn set_compression_mode(&mut self, mode: u8) -> Result<(), MessageError> {
        self.request(facility::DATA_ACCESS, data::SET_COMP_MODE, &[mode])?;
        Ok(())
    }

    pub fn set_moni_intervals(&mut self, hw_ival: u32, cf_ival: u32) -> Result<(), MessageError> {
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&hw_ival.to_be_bytes());
        payload.extend_from_slice(&cf_ival.to_be_bytes());
        self.request(facility::DATA_ACCESS, data::SET_MONI_IVAL, &payload)?;
        Ok(())
    }

    pub fn reset_moni_buffer(&mut self) -> Result<(), MessageError> {
        self.request(facility::DATA_ACCESS, data::RESET_MONI_BUF, &[])?;
        Ok(())
    }

    pub fn reset_lookback_memory(&mut self) -> Result<(), MessageError> {
        self.request(facility::DATA_ACCESS, data::RESET_LOOKBACK_MEMORY, &[])?;
        Ok(())
    }

    /// Arms the supernova scalers; must precede `begin_run`.
    pub fn enable_sn(&mut self, deadtime_ns: i32, mode: u8) -> Result<(), MessageError> {
        let mut payload = Vec::with_capacity(5);
        payload.extend_from_slice(&deadtime_ns.to_be_bytes());
        payload.push(mode);
        self.request(facility::SLOW_CONTROL, slow::ENABLE_SN, &payload)?;
        Ok(())
    }

    pub fn disable_sn(&mut self) -> Result<(), MessageError> {
        self.request(facility::SLOW_CONTROL, slow::DISABLE_SN, &[])?;
        Ok(())
    }

    pub fn set_scaler_deadtime(&mut self, deadtime_ns: u32) -> Result<(), MessageError> {
        self.request(
            facility::SLOW_CONTROL,
            slow::SET_SCALER_DEADTIME,
            &deadtime_ns.to_be_bytes(),
        )?;
        Ok(())
    }

    // --- high voltage (capability gated) --------------------------------

    /// Enables the PMT supply. Requires an HV grant.
    pub fn enable_hv(&mut self, token: Option<&HvToken>) -> Result<(), MessageError> {
        if token.is_none() {
            return Err(MessageError::NotAuthorizedForHv);
        }
        self.request(facility::SLOW_CONTROL, slow::ENABLE_PMT_HV, &[])?;
        Ok(())
    }

    pub fn disable_hv(&mut self) -> Result<(), MessageError> {
        self.request(facility::SLOW_CONTROL, slow::DISABLE_PMT_HV, &[])?;
        Ok(())
    }

    /// Sets the PMT supply in DAC counts (0..=4095, two counts per volt).
    /// A non-zero target requires an HV grant; zero is always allowed.
    pub fn set_hv(&mut self, token: Option<&HvToken>, dac_counts: u16) -> Result<(), MessageError> {
        if dac_counts > 0 && token.is_none() {
            return Err(MessageError::NotAuthorizedForHv);
        }
        self.request(
            facility::SLOW_CONTROL,
            slow::SET_PMT_HV,
            &dac_counts.to_be_bytes(),
        )?;
        Ok(())
    }

    /// Reads back the supply as (ADC counts, DAC counts).
    pub fn query_hv(&mut self) -> Result<(u16, u16), MessageError> {
        let raw = self.request(facility::SLOW_CONTROL, slow::QUERY_PMT_HV, &[])?;
        if raw.len() < 4 {
            return Err(MessageError::Truncated {
                wanted: 4,
                partial: raw,
            });
        }
        Ok((
            u16::from_be_bytes([raw[0], raw[1]]),
            u16::from_be_bytes([raw[2], raw[3]]),
        ))
    }

    // --- run control and bulk pulls -------------------------------------

    pub fn begin_run(&mut self) -> Result<(), MessageError> {
        self.request(facility::EXPERIMENT_CONTROL, expctl::BEGIN_RUN, &[])?;
        Ok(())
    }

    pub fn end_run(&mut self) -> Result<(), MessageError> {
        self.request(facility::EXPERIMENT_CONTROL, expctl::END_RUN, &[])?;
        Ok(())
    }

    /// One waveform-buffer pull; empty means nothing accumulated yet.
    pub fn get_waveform_data(&mut self) -> Result<Vec<u8>, MessageError> {
        self.request(facility::DATA_ACCESS, data::GET_DATA, &[])
    }

    /// One monitoring-buffer pull; empty means drained.
    pub fn get_moni_data(&mut self) -> Result<Vec<u8>, MessageError> {
        self.request(facility::DATA_ACCESS, data::GET_NEXT_MONI_REC, &[])
    }

    /// One supernova-buffer pull; empty means nothing accumulated yet.
    pub fn get_sn_data(&mut self) -> Result<Vec<u8>, MessageError> {
        self.request(facility::DATA_ACCESS, data::GET_SN_DATA, &[])
    }

    /// Drains the monitoring buffer to empty, collecting parsed records
    /// into a caller-owned vector. The module accumulates records between
    /// polls, so a single pull never suffices.
    pub fn drain_moni(&mut self) -> Result<Vec<MoniRecord>, MessageError> {
        let mut records = Vec::new();
        loop {
            let buf = self.get_moni_data()?;
            if buf.is_empty() {
                return Ok(records);
            }
            records.extend(MoniRecord::parse_buffer(&buf));
        }
    }
}
