//! Half-duplex transport to the panel
//!
//! The transport owns the duplex byte channel and the sequence counter. A
//! write frames a packet with the current sequence number and then advances
//! it; a read waits for the panel's ACK byte and then for a fixed-size reply,
//! both bounded by the resend timeout.
//!
//! Input left over from an earlier exchange is discarded before every packet
//! write, so a late reply can never be read as the answer to the next
//! request.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::core::{Configuration, Error, Result, ACK};
use crate::protocol::{Packet, SequenceCounter};
use crate::time::Clock;
use crate::util::to_hex;

#[cfg(test)]
pub(crate) mod mock;

/// Parameters for opening the serial channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Port identity, e.g. `/dev/ttyUSB0` or `COM1`
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Timeout of a single raw read
    pub read_timeout: Duration,
    /// Time allowed for the ACK and the full reply
    pub resend_timeout: Duration,
}

impl ChannelConfig {
    /// Extracts the channel parameters for the host platform
    pub fn from_configuration(config: &Configuration) -> Result<Self> {
        Ok(ChannelConfig {
            port: config.channel_port()?,
            baud_rate: config.baud_rate(),
            data_bits: config.data_bits()?,
            parity: config.parity()?,
            stop_bits: config.stop_bits()?,
            read_timeout: config.read_timeout(),
            resend_timeout: config.resend_timeout(),
        })
    }
}

/// Duplex byte channel the transport talks through
pub trait Channel: Read + Write {
    /// Drops bytes that were received but not read yet
    fn discard_input(&mut self) -> io::Result<()>;

    /// Sets how long a single read may block
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl Channel for Box<dyn SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        (**self).clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        (**self).set_timeout(timeout).map_err(io::Error::from)
    }
}

/// Framed packet writer and ACK-gated reply reader over a byte channel
pub struct Transport<C> {
    channel: C,
    sequence: SequenceCounter,
    /// Upper bound of a single read
    read_timeout: Duration,
    resend_timeout: Duration,
}

impl Transport<Box<dyn SerialPort>> {
    /// Opens the serial port described by `config`
    ///
    /// The port is closed when the transport is dropped.
    pub fn open(config: &ChannelConfig) -> Result<Self> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| Error::ChannelOpen {
                port: config.port.clone(),
                source,
            })?;

        info!(port = %config.port, baud = config.baud_rate, "channel open");
        Ok(Transport::new(port, config.resend_timeout).with_read_timeout(config.read_timeout))
    }
}

impl<C: Channel> Transport<C> {
    /// Wraps an already open channel
    ///
    /// Single reads are bounded by the resend timeout until
    /// [`with_read_timeout`](Self::with_read_timeout) says otherwise.
    pub fn new(channel: C, resend_timeout: Duration) -> Self {
        Transport {
            channel,
            sequence: SequenceCounter::new(),
            read_timeout: resend_timeout,
            resend_timeout,
        }
    }

    /// Sets the timeout of a single raw read
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Sequence number the next packet will carry
    pub fn sequence(&self) -> u8 {
        self.sequence.current()
    }

    /// Time allowed for a reply
    pub fn resend_timeout(&self) -> Duration {
        self.resend_timeout
    }

    /// The underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The underlying channel, mutably
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Writes raw bytes without framing
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.channel.write_all(bytes)?;
        self.channel.flush()?;
        debug!(bytes = %to_hex(bytes), "sent");
        Ok(())
    }

    /// Frames `packet` with the current sequence number, writes it, then
    /// advances the sequence counter
    ///
    /// Pending input is discarded first. The counter only moves once the
    /// write succeeded.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        self.channel.discard_input()?;
        let bytes = packet.serialize(self.sequence.current());
        self.write(&bytes)?;
        self.sequence.advance();
        Ok(())
    }

    /// Waits for the ACK byte, then for exactly `expected_size` reply bytes
    ///
    /// Returns `Ok(None)` when the resend timeout passes first. Each raw read
    /// is capped at the time left, so the call returns within the resend
    /// timeout. Bytes seen before the ACK are discarded. An `expected_size`
    /// of zero returns an empty reply without reading.
    pub fn read_reply(&mut self, expected_size: usize) -> Result<Option<Vec<u8>>> {
        if expected_size == 0 {
            return Ok(Some(Vec::new()));
        }

        let reply = self.read_reply_within(expected_size, &Clock::new());
        let restored = self.channel.set_read_timeout(self.read_timeout);
        let reply = reply?;
        restored?;
        Ok(reply)
    }

    fn read_reply_within(&mut self, expected_size: usize, clock: &Clock) -> Result<Option<Vec<u8>>> {
        let mut byte = [0u8; 1];
        loop {
            if clock.has_elapsed(self.resend_timeout) {
                warn!(timeout = ?self.resend_timeout, "no ACK from panel, skipping request");
                return Ok(None);
            }
            self.bound_read(clock)?;
            match self.channel.read(&mut byte) {
                Ok(1) if byte[0] == ACK => {
                    debug!("ACK received");
                    break;
                }
                Ok(1) => debug!(byte = byte[0], "discarding byte before ACK"),
                Ok(_) => {}
                Err(e) if is_idle(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut reply = vec![0u8; expected_size];
        let mut filled = 0;
        while filled < expected_size {
            if clock.has_elapsed(self.resend_timeout) {
                warn!(
                    received = filled,
                    expected = expected_size,
                    "incomplete reply from panel, skipping request"
                );
                return Ok(None);
            }
            self.bound_read(clock)?;
            match self.channel.read(&mut reply[filled..]) {
                Ok(n) => filled += n,
                Err(e) if is_idle(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(bytes = %to_hex(&reply), "received");
        Ok(Some(reply))
    }

    /// Keeps the next read from blocking past the resend timeout
    fn bound_read(&mut self, clock: &Clock) -> Result<()> {
        let remaining = clock.remaining(self.resend_timeout);
        if remaining < self.read_timeout {
            self.channel.set_read_timeout(remaining)?;
        }
        Ok(())
    }

    /// Writes `packet`, then reads a reply of `expected_size` bytes
    pub fn exchange(&mut self, packet: &Packet, expected_size: usize) -> Result<Option<Vec<u8>>> {
        self.write_packet(packet)?;
        self.read_reply(expected_size)
    }
}

/// Read errors that only mean no byte has arrived yet
fn is_idle(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
