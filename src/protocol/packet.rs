//! Packet framing
//!
//! ```text
//! +-----+-----+----------------+-----------------+----------+
//! | SOH | seq | header fields  | payload fields  | checksum |
//! +-----+-----+----------------+-----------------+----------+
//! ```
//!
//! The checksum is the sum of every byte after SOH, modulo 256.

use bytes::BufMut;

use crate::core::{Error, ProtocolVersion, Result, SEQ_WRAP, SOH};

use super::content::{ByteContainer, FieldTable};
use super::header::{Header, PROTOCOL_SIGNATURE};

/// Prefix of payload names that shadow a header name in the combined field set
pub const PAYLOAD_PREFIX: &str = "payload.";

/// Rolling 4-bit sequence number, 1 to 15
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter(u8);

impl Default for SequenceCounter {
    fn default() -> Self {
        SequenceCounter(1)
    }
}

impl SequenceCounter {
    /// Creates a counter starting at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next packet will carry
    pub fn current(&self) -> u8 {
        self.0
    }

    /// Moves to the next sequence number, wrapping from 15 back to 1
    pub fn advance(&mut self) {
        self.0 += 1;
        if self.0 > SEQ_WRAP {
            self.0 = 1;
        }
    }

    /// Returns to the starting sequence number
    pub fn reset(&mut self) {
        self.0 = 1;
    }
}

/// A header plus payload, ready to be framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: Header,
    payload: FieldTable,
    fields: FieldTable,
}

impl Packet {
    /// Combines a header and payload into a packet
    ///
    /// The header's packet length grows by the number of payload bytes. A
    /// payload field sharing its name with a header field (the point
    /// information `channel`, say) stays a separate wire byte and is listed
    /// as `payload.<name>` in the combined field set.
    pub fn build(header: impl Into<Header>, payload: FieldTable) -> Result<Self> {
        let mut header = header.into();

        if header.version() == ProtocolVersion::V6 && payload.contains(PROTOCOL_SIGNATURE) {
            return Err(Error::invalid_value(format!(
                "'{}' is immutable and cannot be set from the payload",
                PROTOCOL_SIGNATURE
            )));
        }

        let length = header.packet_length() as usize + payload.encoded_len();
        let length = u8::try_from(length).map_err(|_| {
            Error::invalid_value(format!("packet length {} does not fit in one byte", length))
        })?;
        header.set_packet_length(length)?;

        let mut fields = FieldTable::new();
        for (name, value) in header.fields().iter() {
            fields.insert(name, value.clone())?;
        }
        for (name, value) in payload.iter() {
            if header.fields().contains(name) {
                fields.insert(format!("{}{}", PAYLOAD_PREFIX, name), value.clone())?;
            } else {
                fields.insert(name, value.clone())?;
            }
        }

        Ok(Packet {
            header,
            payload,
            fields,
        })
    }

    /// Builds a packet that carries only a header
    pub fn header_only(header: impl Into<Header>) -> Result<Self> {
        Self::build(header, FieldTable::new())
    }

    /// The packet header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The payload fields
    pub fn payload(&self) -> &FieldTable {
        &self.payload
    }

    /// Number of bytes `serialize` produces
    pub fn framed_len(&self) -> usize {
        2 + self.fields.encoded_len() + 1
    }

    /// Frames the packet with `seq` and a trailing checksum
    ///
    /// Pure: the caller owns the sequence counter.
    pub fn serialize(&self, seq: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.framed_len());
        buf.put_u8(SOH);
        buf.put_u8(seq);
        self.header.fields().encode(&mut buf);
        self.payload.encode(&mut buf);
        let sum = checksum(&buf[1..]);
        buf.put_u8(sum);
        buf
    }
}

impl ByteContainer for Packet {
    fn fields(&self) -> &FieldTable {
        &self.fields
    }
}

/// Sum of `bytes` modulo 256
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}
