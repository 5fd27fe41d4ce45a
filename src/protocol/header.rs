//! Local headers for MX Speak 5 and 6
//!
//! A local header is used when talking to the panel over its COM2 serial
//! port. Field order is wire order.

use crate::core::{Error, PacketConfig, ProtocolVersion, Result};

use super::content::{ByteContainer, FieldTable};

/// Name of the packet length field
pub const PACKET_LENGTH: &str = "packet_length";
/// Name of the immutable MX Speak 6 signature field
pub const PROTOCOL_SIGNATURE: &str = "protocol_signature";
/// Name of the packet id field
pub const PACKET_ID: &str = "packet_id";

/// MX Speak 5 local header field order
pub const V5_FIELDS: [&str; 9] = [
    PACKET_LENGTH,
    "network_node",
    "channel",
    "destination_channel_address",
    "destination_task",
    "source_channel_address",
    "source_task",
    "marker",
    PACKET_ID,
];

/// MX Speak 6 local header field order
pub const V6_FIELDS: [&str; 11] = [
    PACKET_LENGTH,
    PROTOCOL_SIGNATURE,
    "network_node",
    "channel",
    "destination_channel_address",
    "destination_task",
    "source_channel_address",
    "source_task",
    "marker",
    PACKET_ID,
    "reserved",
];

/// Values a header takes before any override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderDefaults {
    /// Packet length of an MX Speak 5 header
    pub v5_packet_length: u8,
    /// Packet length of an MX Speak 6 header
    pub v6_packet_length: u8,
    /// MX Speak 6 protocol signature
    pub signature: u8,
}

impl Default for HeaderDefaults {
    fn default() -> Self {
        HeaderDefaults::from(&PacketConfig::default())
    }
}

impl From<&PacketConfig> for HeaderDefaults {
    fn from(config: &PacketConfig) -> Self {
        HeaderDefaults {
            v5_packet_length: config.mx5_default_packet_length,
            v6_packet_length: config.mx6_default_packet_length,
            signature: config.mx_speak_signature,
        }
    }
}

/// MX Speak 5 local header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHeaderV5 {
    fields: FieldTable,
}

impl LocalHeaderV5 {
    /// Creates a header with default values
    pub fn new(packet_id: u8) -> Self {
        let defaults = HeaderDefaults::default();
        Self {
            fields: default_table(&V5_FIELDS, defaults.v5_packet_length, None, packet_id),
        }
    }

    /// Creates a header, then applies `overrides` to declared fields
    pub fn with_overrides(
        packet_id: u8,
        defaults: &HeaderDefaults,
        overrides: &[(&str, u8)],
    ) -> Result<Self> {
        let mut fields = default_table(&V5_FIELDS, defaults.v5_packet_length, None, packet_id);
        apply_overrides(&mut fields, overrides)?;
        Ok(Self { fields })
    }
}

impl ByteContainer for LocalHeaderV5 {
    fn fields(&self) -> &FieldTable {
        &self.fields
    }
}

/// MX Speak 6 local header
///
/// Carries a protocol signature that is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHeaderV6 {
    fields: FieldTable,
}

impl LocalHeaderV6 {
    /// Creates a header with default values
    pub fn new(packet_id: u8) -> Self {
        let defaults = HeaderDefaults::default();
        Self {
            fields: default_table(
                &V6_FIELDS,
                defaults.v6_packet_length,
                Some(defaults.signature),
                packet_id,
            ),
        }
    }

    /// Creates a header, then applies `overrides` to declared fields
    ///
    /// Any override naming the protocol signature is rejected with
    /// [`Error::InvalidValue`], whatever else is supplied.
    pub fn with_overrides(
        packet_id: u8,
        defaults: &HeaderDefaults,
        overrides: &[(&str, u8)],
    ) -> Result<Self> {
        if overrides.iter().any(|(name, _)| *name == PROTOCOL_SIGNATURE) {
            return Err(Error::invalid_value(format!(
                "'{}' is immutable and cannot be overridden",
                PROTOCOL_SIGNATURE
            )));
        }

        let mut fields = default_table(
            &V6_FIELDS,
            defaults.v6_packet_length,
            Some(defaults.signature),
            packet_id,
        );
        apply_overrides(&mut fields, overrides)?;
        Ok(Self { fields })
    }
}

impl ByteContainer for LocalHeaderV6 {
    fn fields(&self) -> &FieldTable {
        &self.fields
    }
}

/// Header of either protocol revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// MX Speak 5
    V5(LocalHeaderV5),
    /// MX Speak 6
    V6(LocalHeaderV6),
}

impl Header {
    /// Builds the local header for `version`
    pub fn build(
        version: ProtocolVersion,
        packet_id: u8,
        defaults: &HeaderDefaults,
        overrides: &[(&str, u8)],
    ) -> Result<Self> {
        match version {
            ProtocolVersion::V5 => {
                LocalHeaderV5::with_overrides(packet_id, defaults, overrides).map(Header::V5)
            }
            ProtocolVersion::V6 => {
                LocalHeaderV6::with_overrides(packet_id, defaults, overrides).map(Header::V6)
            }
        }
    }

    /// Protocol revision of this header
    pub fn version(&self) -> ProtocolVersion {
        match self {
            Header::V5(_) => ProtocolVersion::V5,
            Header::V6(_) => ProtocolVersion::V6,
        }
    }

    /// Current value of the packet length field
    pub fn packet_length(&self) -> u8 {
        self.fields()
            .get(PACKET_LENGTH)
            .and_then(|value| value.as_byte())
            .unwrap_or_default()
    }

    pub(crate) fn set_packet_length(&mut self, length: u8) -> Result<()> {
        let fields = match self {
            Header::V5(header) => &mut header.fields,
            Header::V6(header) => &mut header.fields,
        };
        fields.set(PACKET_LENGTH, length)
    }
}

impl ByteContainer for Header {
    fn fields(&self) -> &FieldTable {
        match self {
            Header::V5(header) => header.fields(),
            Header::V6(header) => header.fields(),
        }
    }
}

impl From<LocalHeaderV5> for Header {
    fn from(header: LocalHeaderV5) -> Self {
        Header::V5(header)
    }
}

impl From<LocalHeaderV6> for Header {
    fn from(header: LocalHeaderV6) -> Self {
        Header::V6(header)
    }
}

fn default_table(names: &[&str], packet_length: u8, signature: Option<u8>, packet_id: u8) -> FieldTable {
    let mut table = FieldTable::new();
    for &name in names {
        let value = match name {
            PACKET_LENGTH => packet_length,
            PROTOCOL_SIGNATURE => signature.unwrap_or_default(),
            PACKET_ID => packet_id,
            _ => 0x00,
        };
        // Names are unique constants, so the insert cannot collide
        let _ = table.insert(name, value);
    }
    table.into_fixed()
}

fn apply_overrides(fields: &mut FieldTable, overrides: &[(&str, u8)]) -> Result<()> {
    for &(name, value) in overrides {
        fields.set(name, value)?;
    }
    Ok(())
}
