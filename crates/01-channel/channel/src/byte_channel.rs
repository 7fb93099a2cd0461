use std::io::{self, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

use log::trace;

use crate::error::ChannelError;
use crate::poll::{PollTimer, READ_POLL, WRITE_POLL};
use crate::DomAddr;

/// Largest single read issued against a device handle.
///
/// Matches the hub driver's transfer granularity; reads never return more
/// than one driver buffer at a time anyway.
pub const BLOCK_SIZE: usize = 4092;

/// A raw, non-blocking, bidirectional byte stream bound to one module.
///
/// The collaborator behind this trait (device node, emulator) signals
/// "nothing available" / "no room" with [`ErrorKind::WouldBlock`]; every
/// other error is a genuine device failure.
pub trait RawDevice: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// Opens raw devices and drives the per-module control paths.
///
/// Boot-mode transitions invalidate buffered driver state, so channels are
/// reopened through the same provider that created them. The softboot and
/// comm-reset nodes sit outside the byte stream entirely; the two read-only
/// paths are diagnostics, never protocol logic.
pub trait ChannelProvider: Send + Sync {
    fn open(&self, addr: DomAddr) -> Result<Box<dyn RawDevice>, ChannelError>;

    /// Writes the reset token to the softboot control path. Lands the
    /// module in Iceboot regardless of its previous mode.
    fn softboot(&self, addr: DomAddr) -> Result<(), ChannelError>;

    /// Writes the reset token to the is-communicating control path.
    fn comm_reset(&self, addr: DomAddr) -> Result<(), ChannelError>;

    /// Link statistics for this module (diagnostic dump).
    fn comm_stats(&self, addr: DomAddr) -> Result<String, ChannelError>;

    /// Low-level register dump for this module's card (diagnostic dump).
    fn fpga_regs(&self, addr: DomAddr) -> Result<String, ChannelError>;
}

/// Blocking-with-timeout byte stream over one [`RawDevice`].
///
/// Owned exclusively by its channel's execution context; operations take
/// `&mut self`, so the half-duplex protocol cannot interleave.
pub struct ByteChannel {
    addr: DomAddr,
    provider: Arc<dyn ChannelProvider>,
    dev: Box<dyn RawDevice>,
}

impl ByteChannel {
    pub fn open(provider: Arc<dyn ChannelProvider>, addr: DomAddr) -> Result<Self, ChannelError> {
        let dev = provider.open(addr)?;
        Ok(Self {
            addr,
            provider,
            dev,
        })
    }

    pub fn addr(&self) -> DomAddr {
        self.addr
    }

    /// Drops the device handle and opens a fresh one.
    ///
    /// Required after every boot-mode transition: mode changes invalidate
    /// the driver's buffered I/O state for the old handle.
    pub fn reopen(&mut self) -> Result<(), ChannelError> {
        self.dev = self.provider.open(self.addr)?;
        Ok(())
    }

    /// Writes all of `bytes`, retrying on would-block until `timeout`.
    ///
    /// Partial writes advance through the buffer; a deadline with bytes
    /// still unwritten is [`ChannelError::WriteTimeout`], a channel-level
    /// failure.
    pub fn write_all(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), ChannelError> {
        let timer = PollTimer::new(timeout);
        let mut written = 0;
        while written < bytes.len() {
            match self.dev.write(&bytes[written..]) {
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => timer.sleep(WRITE_POLL),
                Err(e) => return Err(ChannelError::Io(e)),
            }
            if written < bytes.len() && timer.expired() {
                return Err(ChannelError::WriteTimeout {
                    wanted: bytes.len(),
                    written,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        }
        trace!("{}: wrote {} bytes", self.addr, written);
        Ok(())
    }

    /// Performs one non-blocking read burst, appending to `out`.
    ///
    /// Returns the number of bytes appended; zero means nothing was
    /// available. Callers loop under their own [`PollTimer`].
    pub fn read_burst(&mut self, out: &mut Vec<u8>) -> Result<usize, ChannelError> {
        let mut chunk = [0u8; BLOCK_SIZE];
        match self.dev.read(&mut chunk) {
            Ok(n) => {
                out.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(ChannelError::Io(e)),
        }
    }

    /// Reads until `out` holds at least `want` bytes or the timer expires.
    ///
    /// Returns `true` when the target was reached. Accumulated bytes stay
    /// in `out` either way so callers can diagnose short reads.
    pub fn read_until(
        &mut self,
        out: &mut Vec<u8>,
        want: usize,
        timer: &PollTimer,
    ) -> Result<bool, ChannelError> {
        loop {
            if out.len() >= want {
                return Ok(true);
            }
            if timer.expired() {
                return Ok(false);
            }
            if self.read_burst(out)? == 0 {
                timer.sleep(READ_POLL);
            }
        }
    }

    pub fn softboot(&self) -> Result<(), ChannelError> {
        self.provider.softboot(self.addr)
    }

    pub fn comm_reset(&self) -> Result<(), ChannelError> {
        self.provider.comm_reset(self.addr)
    }

    pub fn comm_stats(&self) -> Result<String, ChannelError> {
        self.provider.comm_stats(self.addr)
    }

    pub fn fpga_regs(&self) -> Result<String, ChannelError> {
        self.provider.fpga_regs(self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomSlot;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted device: pops read chunks from a queue, records writes,
    /// and can simulate a saturated driver.
    struct Scripted {
        reads: VecDeque<io::Result<Vec<u8>>>,
        wrote: Vec<u8>,
        write_quota: usize,
    }

    struct SharedDev(Arc<Mutex<Scripted>>);

    impl RawDevice for SharedDev {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut inner = self.0.lock().unwrap();
            match inner.reads.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::from(ErrorKind::WouldBlock)),
            }
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut inner = self.0.lock().unwrap();
            if inner.write_quota == 0 {
                return Err(io::Error::from(ErrorKind::WouldBlock));
            }
            let n = buf.len().min(inner.write_quota);
            inner.write_quota -= n;
            let chunk = buf[..n].to_vec();
            inner.wrote.extend_from_slice(&chunk);
            Ok(n)
        }
    }

    struct ScriptedProvider(Arc<Mutex<Scripted>>);

    impl ChannelProvider for ScriptedProvider {
        fn open(&self, _addr: DomAddr) -> Result<Box<dyn RawDevice>, ChannelError> {
            Ok(Box::new(SharedDev(Arc::clone(&self.0))))
        }
        fn softboot(&self, _addr: DomAddr) -> Result<(), ChannelError> {
            Ok(())
        }
        fn comm_reset(&self, _addr: DomAddr) -> Result<(), ChannelError> {
            Ok(())
        }
        fn comm_stats(&self, _addr: DomAddr) -> Result<String, ChannelError> {
            Ok(String::new())
        }
        fn fpga_regs(&self, _addr: DomAddr) -> Result<String, ChannelError> {
            Ok(String::new())
        }
    }

    fn channel_with(script: Scripted) -> (ByteChannel, Arc<Mutex<Scripted>>) {
        let shared = Arc::new(Mutex::new(script));
        let provider = Arc::new(ScriptedProvider(Arc::clone(&shared)));
        let chan = ByteChannel::open(provider, DomAddr::new(0, 0, DomSlot::A)).unwrap();
        (chan, shared)
    }

    #[test]
    fn write_all_advances_through_partial_writes() {
        let (mut chan, shared) = channel_with(Scripted {
            reads: VecDeque::new(),
            wrote: Vec::new(),
            write_quota: 11,
        });
        chan.write_all(b"hello world", Duration::from_millis(100))
            .unwrap();
        assert_eq!(shared.lock().unwrap().wrote, b"hello world");
    }

    #[test]
    fn write_all_times_out_when_driver_stays_full() {
        let (mut chan, _shared) = channel_with(Scripted {
            reads: VecDeque::new(),
            wrote: Vec::new(),
            write_quota: 3,
        });
        let err = chan
            .write_all(b"hello", Duration::from_millis(30))
            .unwrap_err();
        match err {
            ChannelError::WriteTimeout {
                wanted, written, ..
            } => {
                assert_eq!(wanted, 5);
                assert_eq!(written, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_until_accumulates_across_bursts() {
        let (mut chan, _shared) = channel_with(Scripted {
            reads: VecDeque::from([
                Ok(b"abc".to_vec()),
                Err(io::Error::from(ErrorKind::WouldBlock)),
                Ok(b"defg".to_vec()),
            ]),
            wrote: Vec::new(),
            write_quota: 0,
        });
        let mut out = Vec::new();
        let timer = PollTimer::new(Duration::from_millis(500));
        assert!(chan.read_until(&mut out, 7, &timer).unwrap());
        assert_eq!(out, b"abcdefg");
    }

    #[test]
    fn read_until_reports_short_read_on_deadline() {
        let (mut chan, _shared) = channel_with(Scripted {
            reads: VecDeque::from([Ok(b"ab".to_vec())]),
            wrote: Vec::new(),
            write_quota: 0,
        });
        let mut out = Vec::new();
        let timer = PollTimer::new(Duration::from_millis(30));
        assert!(!chan.read_until(&mut out, 10, &timer).unwrap());
        assert_eq!(out, b"ab");
    }
}
