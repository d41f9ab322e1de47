use marker_signal_common::config::SerialConfig;
use std::io::{self, Read, Write};
use tracing::{debug, info};

/// Byte sent when the policy reports an object.
pub const SIGNAL_DETECTED: u8 = 0x01;
/// Byte sent when the policy reports nothing.
pub const SIGNAL_CLEAR: u8 = 0x00;

/// Wire encoding of the presence signal. This byte is the whole protocol:
/// no framing, checksum or acknowledgement.
pub const fn signal_byte(signal: bool) -> u8 {
    if signal {
        SIGNAL_DETECTED
    } else {
        SIGNAL_CLEAR
    }
}

/// Byte-level channel to the microcontroller.
pub trait SerialLink {
    /// Read whatever inbound bytes are already pending. Must not wait for more.
    fn drain_input(&mut self) -> io::Result<Vec<u8>>;

    /// Write one byte and flush it out.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

impl SerialLink for Box<dyn serialport::SerialPort> {
    fn drain_input(&mut self) -> io::Result<Vec<u8>> {
        let pending = self.bytes_to_read().map_err(io::Error::from)? as usize;
        if pending == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; pending];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])?;
        self.flush()
    }
}

/// Open the serial device named in the config.
///
/// The read timeout bounds how long a drain can block if the driver reports
/// pending bytes that are slow to arrive.
pub fn open_serial(config: &SerialConfig) -> Result<Box<dyn serialport::SerialPort>, LinkError> {
    info!(path = config.path, baud = config.baud_rate, "connecting to serial");
    let port = serialport::new(config.path.as_str(), config.baud_rate)
        .timeout(config.read_timeout())
        .open()
        .map_err(|source| LinkError::Open {
            path: config.path.clone(),
            source,
        })?;
    info!(path = config.path, "connected to serial");
    Ok(port)
}

/// Sends one presence byte per call over an already-open link.
pub struct SignalTransmitter<L> {
    link: L,
    sent: u64,
}

impl<L: SerialLink> SignalTransmitter<L> {
    pub fn new(link: L) -> Self {
        Self { link, sent: 0 }
    }

    /// Pull any unsolicited bytes the microcontroller sent us. They carry no
    /// meaning for the loop and are only handed to observers.
    pub fn drain(&mut self) -> Result<Vec<u8>, LinkError> {
        let bytes = self.link.drain_input().map_err(LinkError::Read)?;
        if !bytes.is_empty() {
            debug!(len = bytes.len(), "drained inbound serial bytes");
        }
        Ok(bytes)
    }

    /// Write exactly one byte encoding `signal`. No retry on failure.
    pub fn send(&mut self, signal: bool) -> Result<(), LinkError> {
        self.link
            .write_byte(signal_byte(signal))
            .map_err(LinkError::Write)?;
        self.sent += 1;
        Ok(())
    }

    /// Number of signal bytes written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },
    #[error("serial read failed: {0}")]
    Read(io::Error),
    #[error("serial write failed: {0}")]
    Write(io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryLink;

    #[test]
    fn true_writes_one() {
        let mut tx = SignalTransmitter::new(MemoryLink::default());
        tx.send(true).unwrap();
        assert_eq!(tx.link().written(), vec![0x01]);
        assert_eq!(tx.sent(), 1);
    }

    #[test]
    fn false_writes_zero() {
        let mut tx = SignalTransmitter::new(MemoryLink::default());
        tx.send(false).unwrap();
        assert_eq!(tx.link().written(), vec![0x00]);
    }

    #[test]
    fn one_byte_per_send() {
        let mut tx = SignalTransmitter::new(MemoryLink::default());
        for signal in [true, false, false, true] {
            tx.send(signal).unwrap();
        }
        assert_eq!(tx.link().written(), vec![1, 0, 0, 1]);
        assert_eq!(tx.sent(), 4);
    }

    #[test]
    fn drain_returns_pending_bytes() {
        let mut tx = SignalTransmitter::new(MemoryLink::with_inbound(b"ok\n"));
        assert_eq!(tx.drain().unwrap(), b"ok\n".to_vec());
        assert!(tx.drain().unwrap().is_empty());
        assert!(tx.link().written().is_empty());
    }

    #[test]
    fn write_failure_is_reported() {
        let mut tx = SignalTransmitter::new(MemoryLink::failing_writes());
        let err = tx.send(true).unwrap_err();
        assert!(matches!(err, LinkError::Write(_)));
        assert_eq!(tx.sent(), 0);
    }

    #[test]
    fn encoding() {
        assert_eq!(signal_byte(true), 0x01);
        assert_eq!(signal_byte(false), 0x00);
    }
}
