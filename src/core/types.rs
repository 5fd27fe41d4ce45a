use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::error::Error;

/// Revision of the MX Speak specification spoken on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProtocolVersion {
    /// MX Speak 5
    V5,
    /// MX Speak 6
    V6,
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        ProtocolVersion::V5
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(ProtocolVersion::V5),
            6 => Ok(ProtocolVersion::V6),
            other => Err(Error::invalid_value(format!(
                "MX Speak version {} is not supported, expected 5 or 6",
                other
            ))),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::V5 => 5,
            ProtocolVersion::V6 => 6,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MX Speak {}", u8::from(*self))
    }
}

/// A single value held by a field table
///
/// Request fields are bytes or text. Decoded replies additionally carry
/// 16-bit composites and descriptive labels substituted from the code tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// One wire byte
    Byte(u8),
    /// Big-endian pair of wire bytes
    Word(u16),
    /// Text, one wire byte per character
    Text(String),
    /// Descriptive label for a known code
    Label(&'static str),
}

impl FieldValue {
    /// Number of bytes this value occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            FieldValue::Byte(_) => 1,
            FieldValue::Word(_) => 2,
            FieldValue::Text(text) => text.len(),
            FieldValue::Label(label) => label.len(),
        }
    }

    /// Appends the wire bytes of this value to `dst`
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        match self {
            FieldValue::Byte(value) => dst.put_u8(*value),
            FieldValue::Word(value) => dst.put_u16(*value),
            FieldValue::Text(text) => dst.put_slice(text.as_bytes()),
            FieldValue::Label(label) => dst.put_slice(label.as_bytes()),
        }
    }

    /// Returns the value if it is a single byte
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            FieldValue::Byte(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value if it is a 16-bit word
    pub fn as_word(&self) -> Option<u16> {
        match self {
            FieldValue::Word(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the label if a code table matched
    pub fn as_label(&self) -> Option<&'static str> {
        match self {
            FieldValue::Label(label) => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Byte(value) => write!(f, "{}", value),
            FieldValue::Word(value) => write!(f, "{}", value),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Label(label) => f.write_str(label),
        }
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        FieldValue::Byte(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        FieldValue::Word(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}
