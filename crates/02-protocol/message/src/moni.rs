//! Monitoring-record framing.
//!
//! Only the framing header, the 6-byte module clock, and the ASCII /
//! state-change summaries are decoded here; hardware and configuration
//! record payloads stay opaque bytes for downstream codecs.

/// Record type codes.
const TYPE_HARDWARE: u16 = 0xC8;
const TYPE_CONFIG: u16 = 0xC9;
const TYPE_STATE_CHANGE: u16 = 0xCA;
const TYPE_ASCII: u16 = 0xCB;

/// Decoded view of one monitoring record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoniKind {
    Hardware,
    Config,
    /// Free-text log line from the runtime.
    Ascii(String),
    /// One-line summary of a configuration state change.
    StateChange(String),
    Other(u16),
}

/// One monitoring record: framing header plus decoded view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoniRecord {
    pub len: u16,
    pub type_code: u16,
    /// 48-bit module clock from the record header.
    pub clock: u64,
    pub kind: MoniKind,
}

impl MoniRecord {
    /// Walks a pulled buffer, yielding each well-framed record.
    ///
    /// Framing: `{length:u16 BE, type:u16 BE}` then a 6-byte clock, then
    /// `length - 10` payload bytes. The walk stops at the first record
    /// whose declared length is nonsense, so a corrupt tail cannot loop.
    pub fn parse_buffer(buf: &[u8]) -> Vec<MoniRecord> {
        let mut records = Vec::new();
        let mut rest = buf;
        while rest.len() >= 4 {
            let len = u16::from_be_bytes([rest[0], rest[1]]);
            let type_code = u16::from_be_bytes([rest[2], rest[3]]);
            let len_us = len as usize;
            if len_us < 4 || len_us > rest.len() {
                break;
            }
            records.push(Self::decode(len, type_code, &rest[..len_us]));
            rest = &rest[len_us..];
        }
        records
    }

    fn decode(len: u16, type_code: u16, rec: &[u8]) -> MoniRecord {
        let clock = if rec.len() >= 10 {
            rec[4..10]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
        } else {
            0
        };
        let payload = if rec.len() >= 10 { &rec[10..] } else { &[][..] };
        let kind = match type_code {
            TYPE_HARDWARE => MoniKind::Hardware,
            TYPE_CONFIG => MoniKind::Config,
            TYPE_ASCII => MoniKind::Ascii(String::from_utf8_lossy(payload).into_owned()),
            TYPE_STATE_CHANGE => MoniKind::StateChange(state_change_summary(payload)),
            other => MoniKind::Other(other),
        };
        MoniRecord {
            len,
            type_code,
            clock,
            kind,
        }
    }
}

fn state_change_summary(payload: &[u8]) -> String {
    if payload.len() < 2 {
        return "[STATE CHANGE truncated]".to_string();
    }
    let (kind, subkind) = (payload[0], payload[1]);
    let body = &payload[2..];
    let txt = match (kind, subkind) {
        (2, 0x10) | (2, 0x12) => "ENABLE HV".to_string(),
        (2, 0x0E) if body.len() >= 2 => {
            let val = i16::from_be_bytes([body[0], body[1]]);
            format!("SET HV({val})")
        }
        (2, 0x0D) if body.len() >= 4 => {
            let dac = body[0];
            let val = i16::from_be_bytes([body[2], body[3]]);
            format!("SET DAC({dac}<-{val})")
        }
        (2, 0x2D) if !body.is_empty() => format!("SET LC MODE({})", body[0]),
        (2, 0x2F) if body.len() >= 16 => {
            let w: Vec<u32> = body[..16]
                .chunks_exact(4)
                .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            format!("SET LC WIN({} {} {} {})", w[0], w[1], w[2], w[3])
        }
        _ => format!("0x{kind:x}-0x{subkind:x}"),
    };
    format!("[STATE CHANGE {txt}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(type_code: u16, payload: &[u8]) -> Vec<u8> {
        let len = (10 + payload.len()) as u16;
        let mut rec = Vec::new();
        rec.extend_from_slice(&len.to_be_bytes());
        rec.extend_from_slice(&type_code.to_be_bytes());
        rec.extend_from_slice(&[0, 0, 0, 0, 0x12, 0x34]); // clock
        rec.extend_from_slice(payload);
        rec
    }

    #[test]
    fn walks_consecutive_records() {
        let mut buf = record(TYPE_ASCII, b"hello");
        buf.extend_from_slice(&record(TYPE_HARDWARE, &[0u8; 16]));
        let recs = MoniRecord::parse_buffer(&buf);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].kind, MoniKind::Ascii("hello".to_string()));
        assert_eq!(recs[0].clock, 0x1234);
        assert_eq!(recs[1].kind, MoniKind::Hardware);
    }

    #[test]
    fn state_change_hv_set_decodes() {
        let buf = record(TYPE_STATE_CHANGE, &[2, 0x0E, 0x06, 0x40]);
        let recs = MoniRecord::parse_buffer(&buf);
        assert_eq!(
            recs[0].kind,
            MoniKind::StateChange("[STATE CHANGE SET HV(1600)]".to_string())
        );
    }

    #[test]
    fn corrupt_length_stops_the_walk() {
        let mut buf = record(TYPE_ASCII, b"ok");
        buf.extend_from_slice(&[0x00, 0x02, 0x00, 0xCB]); // declared len 2 < header
        let recs = MoniRecord::parse_buffer(&buf);
        assert_eq!(recs.len(), 1);
    }
}
