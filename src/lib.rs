//! MX Speak: serial protocol stack for querying fire-alarm control panels
//!
//! This library implements packet framing, the half-duplex ACK-gated
//! transport and the point information reply decoder for MX Speak 5 and 6,
//! plus a controller that discovers live points and polls them.
pub mod core;
pub mod network;
pub mod protocol;
pub mod time;
pub mod transport;
pub mod util;

// Re-export commonly used items
pub use crate::core::{Configuration, Error, FieldValue, ProtocolVersion, Result};
pub use network::{Controller, ControllerConfig, PointReport};
pub use transport::{Channel, ChannelConfig, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
