//! Core types shared by the rest of the stack
//!
//! Errors, configuration and the value type carried by field tables.

pub mod config;
pub mod error;
pub mod serde;
pub mod types;

pub use self::config::{Configuration, ComConfig, LoggingConfig, PacketConfig, SerialConfig};
pub use self::error::{Error, Result};
pub use self::types::{FieldValue, ProtocolVersion};

/// Start of frame marker
pub const SOH: u8 = 0x01;

/// Byte the panel sends before a reply payload
pub const ACK: u8 = 0x06;

/// Highest sequence number before wrapping back to 1
pub const SEQ_WRAP: u8 = 0x0f;
